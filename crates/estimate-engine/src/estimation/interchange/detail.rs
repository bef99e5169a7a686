use super::xml::{Attrs, XmlWriter};
use super::InterchangeDocument;
use crate::estimation::geometry::{calculate_dim_vars, DimVars, OpeningDeductions};
use crate::estimation::inspection::Room;
use crate::estimation::settlement::SettledLineItem;

const DEFAULT_LEVEL: &str = "Main Level";
const GENERAL_GROUP: &str = "General";

/// Render the detail document: estimate → level → room groups with dimension
/// variables, opening deductions and line items.
pub fn render_detail(document: &InterchangeDocument<'_>) -> String {
    let mut xml = XmlWriter::new();
    let mut line_number: u32 = 0;

    xml.open("GENERIC_ROUGHDRAFT", Attrs::new());
    xml.open("LINE_ITEM_DETAIL", Attrs::new());
    xml.open(
        "GROUP",
        Attrs::new()
            .text("type", "estimate")
            .text("name", document.claim.claim_number.as_str()),
    );

    for (level, rooms) in levels(document.rooms) {
        xml.open("GROUP", Attrs::new().text("type", "level").text("name", level));
        for room in rooms {
            write_room(&mut xml, room, &document.summary.items, &mut line_number);
        }
        xml.close("GROUP");
    }

    let unassigned: Vec<&SettledLineItem> = document
        .summary
        .items
        .iter()
        .filter(|item| item.room_id.is_none())
        .collect();
    if !unassigned.is_empty() {
        xml.open(
            "GROUP",
            Attrs::new().text("type", "general").text("name", GENERAL_GROUP),
        );
        write_items(&mut xml, unassigned, &mut line_number);
        xml.close("GROUP");
    }

    xml.close("GROUP");
    xml.close("LINE_ITEM_DETAIL");
    xml.close("GENERIC_ROUGHDRAFT");
    xml.finish()
}

/// Rooms grouped by structure, in order of first appearance.
fn levels(rooms: &[Room]) -> Vec<(&str, Vec<&Room>)> {
    let mut levels: Vec<(&str, Vec<&Room>)> = Vec::new();
    for room in rooms {
        let level = room
            .structure
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_LEVEL);
        match levels.iter_mut().find(|(name, _)| *name == level) {
            Some((_, members)) => members.push(room),
            None => levels.push((level, vec![room])),
        }
    }
    levels
}

fn write_room(
    xml: &mut XmlWriter,
    room: &Room,
    items: &[SettledLineItem],
    line_number: &mut u32,
) {
    xml.open(
        "GROUP",
        Attrs::new()
            .text("type", "room")
            .text("name", room.name.as_str())
            .text("roomId", room.room_id.as_str())
            .text("roomType", room.room_type.as_str()),
    );

    if let Some(dimensions) = &room.dimensions {
        let report = calculate_dim_vars(dimensions, &room.openings);
        xml.open(
            "ROOM_DIM_VARS",
            Attrs::new()
                .number("length", dimensions.length)
                .number("width", dimensions.width)
                .number("height", dimensions.height)
                .opt_number("wallThickness", dimensions.wall_thickness)
                .opt_number("orientation", dimensions.orientation),
        );
        xml.empty("BEFORE_MW", dim_var_attrs(&report.before_mw));
        xml.empty("AFTER_MW", dim_var_attrs(&report.after_mw));
        xml.close("ROOM_DIM_VARS");
        write_openings(xml, &report.deductions);
    }

    let room_items: Vec<&SettledLineItem> = items
        .iter()
        .filter(|item| item.room_id.as_deref() == Some(room.room_id.as_str()))
        .collect();
    write_items(xml, room_items, line_number);

    xml.close("GROUP");
}

fn dim_var_attrs(vars: &DimVars) -> Attrs {
    vars.attributes()
        .into_iter()
        .fold(Attrs::new(), |attrs, (name, value)| attrs.number(name, value))
}

fn write_openings(xml: &mut XmlWriter, deductions: &OpeningDeductions) {
    xml.open(
        "OPENINGS",
        Attrs::new().number("totalDeduction", deductions.total_area),
    );
    for opening in &deductions.openings {
        xml.empty(
            "OPENING",
            Attrs::new()
                .text("type", opening.opening_type.label())
                .number("width", opening.width)
                .number("height", opening.height)
                .integer("quantity", opening.quantity)
                .number("area", opening.area)
                .opt_text("wall", opening.wall.as_deref())
                .flag("toFloor", opening.goes_to_floor)
                .flag("toCeiling", opening.goes_to_ceiling)
                .flag("defaulted", opening.defaulted),
        );
    }
    xml.close("OPENINGS");
}

fn write_items(xml: &mut XmlWriter, items: Vec<&SettledLineItem>, line_number: &mut u32) {
    xml.open("ITEMS", Attrs::new());
    for item in items {
        *line_number += 1;
        xml.empty(
            "ITEM",
            Attrs::new()
                .integer("lineNum", *line_number)
                .text("cat", item.category.as_str())
                .text("desc", item.description.as_str())
                .number("qty", item.quantity)
                .text("unit", item.unit.label())
                .number("unitPrice", item.unit_price)
                .number("total", item.total_price)
                .number("overhead", item.overhead)
                .number("profit", item.profit)
                .number("taxRate", item.tax_rate)
                .number("tax", item.tax)
                .number("rcv", item.rcv)
                .number("depPct", item.depreciation_pct)
                .text("depType", item.depreciation_type.label())
                .number("depAmount", item.depreciation_amount)
                .number("acv", item.acv)
                .text("coverage", item.coverage.code()),
        );
    }
    xml.close("ITEMS");
}
