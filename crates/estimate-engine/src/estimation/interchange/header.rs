use chrono::SecondsFormat;

use super::xml::{Attrs, XmlWriter};
use super::{ExportOptions, InterchangeDocument};

/// Render the header document: claim identity, coverage snapshot, peril and control points.
pub fn render_header(document: &InterchangeDocument<'_>, options: &ExportOptions) -> String {
    let claim = document.claim;
    let summary = document.summary;
    let mut xml = XmlWriter::new();

    xml.open("XACTDOC", Attrs::new());
    xml.empty(
        "XACTNET_INFO",
        Attrs::new()
            .text("transactionId", options.transaction_id.as_str())
            .text(
                "generated",
                options
                    .generated_at
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
            )
            .opt_text(
                "carrierId",
                claim
                    .carrier_code
                    .as_deref()
                    .or(summary.config.carrier_code.as_deref()),
            )
            .text("rulesVersion", summary.config.table_version.as_str()),
    );

    xml.open(
        "ADM",
        Attrs::new()
            .text("claimNumber", claim.claim_number.as_str())
            .text("policyNumber", claim.policy_number.as_str())
            .opt_text(
                "dateOfLoss",
                claim
                    .date_of_loss
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .as_deref(),
            )
            .opt_text("estimator", claim.estimator.as_deref())
            .opt_text("priceList", claim.price_list.as_deref()),
    );
    xml.empty("INSURED", Attrs::new().text("name", claim.insured_name.as_str()));
    if let Some(address) = &claim.property_address {
        xml.empty(
            "PROPERTY",
            Attrs::new()
                .text("street", address.street.as_str())
                .text("city", address.city.as_str())
                .text("state", address.state.as_str())
                .text("zip", address.postal_code.as_str()),
        );
    }
    xml.close("ADM");

    xml.open("COVERAGES", Attrs::new());
    for rule in document.policy_rules {
        let rollup = summary.coverage(rule.coverage);
        xml.empty(
            "COVERAGE",
            Attrs::new()
                .text("id", rule.coverage.code())
                .text("name", rule.coverage.label())
                .number("deductible", rule.deductible)
                .opt_number("limit", rule.policy_limit)
                .number("rcv", rollup.map_or(0.0, |rollup| rollup.rcv))
                .number("acv", rollup.map_or(0.0, |rollup| rollup.acv))
                .number("netClaim", rollup.map_or(0.0, |rollup| rollup.net_claim)),
        );
    }
    xml.close("COVERAGES");

    xml.empty(
        "PERIL",
        Attrs::new()
            .text("type", claim.peril.peril_type.as_str())
            .opt_text("cause", claim.peril.cause.as_deref())
            .opt_text(
                "waterCategory",
                claim.peril.water_category.map(|value| value.to_string()).as_deref(),
            )
            .opt_text(
                "waterClass",
                claim.peril.water_class.map(|value| value.to_string()).as_deref(),
            ),
    );

    xml.open("CONTROL_POINTS", Attrs::new());
    for point in &claim.control_points {
        xml.empty(
            "CONTROL_POINT",
            Attrs::new()
                .text("name", point.name.as_str())
                .text("status", point.status.label())
                .opt_text(
                    "completed",
                    point
                        .completed_on
                        .map(|date| date.format("%Y-%m-%d").to_string())
                        .as_deref(),
                ),
        );
    }
    xml.close("CONTROL_POINTS");

    let totals = &summary.totals;
    xml.empty(
        "ESTIMATE_TOTALS",
        Attrs::new()
            .number("lineItemTotal", totals.line_item_total)
            .number("overhead", totals.overhead)
            .number("profit", totals.profit)
            .number("tax", totals.tax)
            .number("rcv", totals.rcv)
            .number("recoverableDepreciation", totals.recoverable_depreciation)
            .number("nonRecoverableDepreciation", totals.non_recoverable_depreciation)
            .number("paidWhenIncurred", totals.paid_when_incurred)
            .number("acv", totals.acv)
            .number("deductible", totals.deductible_applied)
            .number("netClaim", totals.net_claim)
            .number("overLimit", totals.over_limit)
            .flag("overheadAndProfit", summary.qualifies_for_op),
    );

    xml.close("XACTDOC");
    xml.finish()
}
