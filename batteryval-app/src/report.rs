use batteryval_core::{
    appraisal::{BidReport, LotComparison, SensitivityReport, ValueView},
    route::RouteAdvisory,
    transport::TransportEstimate,
    valuation::ValuationResult,
};
use batteryval_schemas::route::PermitRequirement;

pub fn print_valuation(result: &ValuationResult) {
    let cur = &result.currency;
    println!("\n--- [Valuation Report] ---");
    println!("========================================");
    let carriers: Vec<&str> = result
        .chemistry
        .primary_metals()
        .iter()
        .map(|m| m.symbol())
        .collect();
    println!(
        "Chemistry: {} ({}), value carried by {}",
        result.chemistry,
        result.chemistry.display_name(),
        if carriers.is_empty() { "-".to_string() } else { carriers.join(", ") }
    );
    println!("Price source: {:?}", result.price_provenance);
    println!("Black mass: {:.2} kg", result.concentrate_weight_kg);
    println!("----------------------------------------");

    println!("\nContained Metal:");
    for (metal, m) in result.metals.iter().filter(|(_, m)| m.contained_mass_kg > 0.0) {
        println!(
            "  - {:<10} {:>10.2} kg  {:>6.2}%  cost {:>12.2} {}",
            metal.name(),
            m.contained_mass_kg,
            m.effective_grade_pct,
            m.cost,
            cur
        );
    }

    println!("\nProduction Schedule:");
    for line in &result.production_schedule {
        println!(
            "  - {:<28} {:>10.2} kg  revenue {:>12.2} {}",
            line.product.to_string(),
            line.output_mass_kg,
            line.revenue,
            cur
        );
    }

    println!("\nEconomics:");
    println!("  - Material Cost:            {:.2} {}", result.material_cost, cur);
    println!("  - Shredding:                {:.2} {}", result.pretreatment.shredding, cur);
    println!("  - Electrolyte Surcharge:    {:.2} {}", result.pretreatment.electrolyte, cur);
    println!("  - Refining:                 {:.2} {}", result.refining_cost, cur);
    println!("  --------------------------------------");
    println!("  - Total OPEX:               {:.2} {}", result.total_opex, cur);
    println!("  - Total Revenue:            {:.2} {}", result.total_revenue, cur);
    println!("  - Net Profit:               {:.2} {}", result.net_profit(), cur);
    println!("  - Margin:                   {:.1}%", result.margin_fraction() * 100.0);

    if !result.warnings.is_empty() {
        println!("\nWarnings:");
        for w in &result.warnings {
            println!("  ! {}", w);
        }
    }
    println!("========================================");
}

pub fn print_transport(estimate: &TransportEstimate) {
    println!("\n--- [Transport Estimate: {}] ---", estimate.mode);
    println!("Sizing: {}", estimate.sizing_note);
    println!("Hazardous: {}", if estimate.hazardous { "yes" } else { "no" });
    println!("  - Base:                     {:.2} {}", estimate.costs.base, estimate.currency);
    println!("  - Hazmat:                   {:.2} {}", estimate.costs.hazmat, estimate.currency);
    if estimate.costs.fuel_surcharge > 0.0 {
        println!("  - Fuel Surcharge:           {:.2} {}", estimate.costs.fuel_surcharge, estimate.currency);
    }
    if estimate.costs.minimum_charge_adjustment > 0.0 {
        println!(
            "  - Minimum Charge Top-up:    {:.2} {}",
            estimate.costs.minimum_charge_adjustment, estimate.currency
        );
    }
    println!("  --------------------------------------");
    println!(
        "  - Total:                    {:.2} {} ({:.3} per kg)",
        estimate.total_cost, estimate.currency, estimate.cost_per_kg
    );
    println!("Transit: ~{} days", estimate.transit_days);
    for note in &estimate.notes {
        println!("  * {}", note);
    }
    if let Some(packaging) = &estimate.packaging {
        println!("\nPackaging ({}):", packaging.class);
        if let Some(un) = &packaging.un_classification {
            println!(
                "  {} / {}{}",
                un.un_number,
                un.hazard_class,
                un.packing_group
                    .as_deref()
                    .map(|g| format!(" / PG {}", g))
                    .unwrap_or_default()
            );
        }
        for r in &packaging.restrictions {
            println!("  ! {}", r);
        }
        for item in &packaging.items {
            println!("  - {}", item);
        }
        if !packaging.regulations.is_empty() {
            println!("  Regulations: {}", packaging.regulations.join("; "));
        }
    }
}

pub fn print_route(advisory: &RouteAdvisory) {
    println!(
        "\n--- [Route {} -> {} ({}), {}] ---",
        advisory.origin, advisory.destination, advisory.material, advisory.evaluated_on
    );
    println!(
        "Status: {}{}",
        advisory.status,
        if advisory.is_allowed() { "" } else { "  (NOT ALLOWED)" }
    );
    if let Some(key) = &advisory.matched_route {
        println!("Matched rule: {} (reference data {})", key, advisory.reference_version);
    }
    if let Some(days) = &advisory.processing_time_days {
        println!("Processing time: {} days", days);
    }
    if let Some(basis) = &advisory.legal_basis {
        println!("Legal basis: {}", basis);
    }

    println!("\nRequirements:");
    for r in &advisory.requirements {
        println!("  - {}", r);
    }
    if !advisory.permits.is_empty() {
        println!("\nPermits:");
        for p in &advisory.permits {
            let when = match &p.requirement {
                PermitRequirement::Always => "required".to_string(),
                PermitRequirement::Conditional { condition } => condition.to_lowercase(),
            };
            let agency = p.agency.as_deref().unwrap_or("-");
            println!("  - {} [{}] ({})", p.name, agency, when);
        }
    }
    for w in &advisory.warnings {
        println!("  ! {}", w);
    }
    for i in &advisory.info {
        println!("  i {}", i);
    }
}

fn print_value_view(view: &ValueView) {
    println!(
        "Weight: {:.0} kg, chemistry {}, prices as of {}",
        view.weight_kg,
        view.chemistry,
        view.price_timestamp.format("%Y-%m-%d %H:%M UTC")
    );
    for m in &view.metals {
        println!(
            "  - {:<10} {:>6.2}%  {:>10.2} kg recoverable  {:>12.2} {}",
            m.metal.name(),
            m.grade_pct,
            m.recoverable_kg,
            m.estimated_value,
            view.currency
        );
    }
    println!(
        "  Total: {:.2} {} ({:.2} per tonne)",
        view.total_value, view.currency, view.value_per_tonne
    );
}

pub fn print_sensitivity(report: &SensitivityReport) {
    println!("\n--- [Indicative Value & Price Sensitivity] ---");
    print_value_view(&report.base);
    println!("\nImpact on total value (%):");
    for m in &report.metals {
        let cells: Vec<String> = m
            .scenarios
            .iter()
            .map(|s| format!("{:+.0}%: {:+.2}", s.price_change_pct, s.impact_pct))
            .collect();
        println!("  - {:<10} {}", m.metal.name(), cells.join("  "));
    }
    if let Some(metal) = report.most_sensitive {
        println!("Most sensitive to: {}", metal.name());
    }
}

pub fn print_comparison(cmp: &LotComparison) {
    println!("\n--- [Lot Comparison] ---");
    for lot in &cmp.ranked {
        println!(
            "  #{} {:<24} {:>8.0} kg  {:<4} {:>10.4} {}/kg  total {:>12.2}",
            lot.rank,
            lot.name,
            lot.view.weight_kg,
            lot.view.chemistry.to_string(),
            lot.value_per_kg,
            cmp.currency,
            lot.view.total_value
        );
    }
    for lot in &cmp.rejected {
        println!("  -- {:<24} rejected: {}", lot.name, lot.error);
    }
    if let Some(stats) = &cmp.stats {
        println!(
            "Best: {} ({:.4}), worst: {} ({:.4}), spread {:.1}%",
            stats.best_lot,
            stats.best_value_per_kg,
            stats.worst_lot,
            stats.worst_value_per_kg,
            stats.spread_pct
        );
        println!(
            "Combined: {:.0} kg worth {:.2} {}",
            stats.total_weight_kg, stats.total_value, cmp.currency
        );
    }
}

pub fn print_bid(bid: &BidReport) {
    println!("\n--- [Battery Material Purchase Quote] ---");
    if let Some(company) = &bid.company {
        println!("From: {}", company);
    }
    if let Some(reference) = &bid.reference {
        println!("Reference: {}", reference);
    }
    println!("Date: {}  Valid until: {}", bid.report_date, bid.valid_until);
    println!(
        "Material: {:.0} kg ({:.3} t), {} ({})",
        bid.weight_kg, bid.weight_tonnes, bid.chemistry, bid.chemistry_name
    );
    println!("\nComposition:");
    for line in &bid.composition {
        let price = line
            .market_price_per_kg
            .map(|p| format!("  market {:.2} {}/kg", p, bid.currency))
            .unwrap_or_default();
        println!(
            "  - {:<10} {:>6.2}%  {:>10.2} kg{}",
            line.metal.name(),
            line.grade_pct,
            line.contained_kg,
            price
        );
    }
    if let Some(date) = bid.market_price_date {
        println!("Market prices as of {}", date.format("%Y-%m-%d"));
    }
    if let (Some(price), Some(total)) = (bid.offered_price_per_kg, bid.total_offered_value) {
        println!(
            "\nOffered: {:.2} {}/kg, total {:.2} {}",
            price, bid.currency, total, bid.currency
        );
    }
    if let Some(lane) = &bid.transport {
        println!("\nTransport {}: {}", lane.route, lane.status);
        for r in &lane.key_requirements {
            println!("  - {}", r);
        }
        if let Some(days) = &lane.processing_time_days {
            println!("  Permit processing: {} days", days);
        }
    }
    println!("\n{}", bid.disclaimer);
}
