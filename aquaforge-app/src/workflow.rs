use crate::{
    cli::{FeedArgs, HistoryArgs, SampleArgs},
    store::FileStore,
};
use anyhow::{Context, Result};
use aquaforge_core::{
    format::{format_grams, format_kg, format_optional, format_percent},
    history::{summarize, GrowthSummary},
    store::{record_biometric, BatchStore},
    FeedingCalculator,
};
use aquaforge_schemas::{
    batch::BatchSnapshot,
    biometric::{BiometricInput, BiometricSample, Uniformity},
    feeding::{FeedingEvent, FeedingInput, FeedingResult},
};
use chrono::Utc;
use serde::Serialize;

pub fn run_feed(store: &FileStore, args: FeedArgs, json: bool) -> Result<()> {
    let kb = store.knowledge_base();
    let batch = kb.batch(&args.batch)?;

    if let Some(tolerance) = kb
        .species
        .get(&batch.species_id)
        .and_then(|s| s.optimal_temperature.as_ref())
    {
        if !tolerance.range.contains(&args.temp) {
            tracing::warn!(
                "{:.1} °C is outside the {:.1}-{:.1} °C range for species '{}'",
                args.temp,
                tolerance.range.min,
                tolerance.range.max,
                batch.species_id
            );
        }
    }

    let plan = FeedingCalculator::default()
        .compute_feeding_plan(batch, &FeedingInput::new(args.weight, args.temp))
        .with_context(|| format!("Could not compute a feeding plan for '{}'", batch.batch_id))?;

    let event = match args.log_grams {
        Some(feed_grams) => {
            let event = FeedingEvent {
                batch_id: batch.batch_id.clone(),
                fed_at: args.fed_at.unwrap_or_else(Utc::now),
                feed_grams,
                feed_type: args.feed_type,
                notes: None,
            };
            store
                .log_feeding(&event)
                .context("Failed to record the feeding")?;
            Some(event)
        }
        None => None,
    };

    if json {
        #[derive(Serialize)]
        struct FeedOutput<'a> {
            batch_id: &'a str,
            plan: &'a FeedingResult,
            logged: Option<&'a FeedingEvent>,
        }
        let output = FeedOutput {
            batch_id: &batch.batch_id,
            plan: &plan,
            logged: event.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_feeding_plan(batch, &plan);
        if let Some(event) = &event {
            println!("Recorded feeding of {} at {}", format_grams(event.feed_grams), event.fed_at);
        }
    }
    Ok(())
}

pub fn run_sample(store: &mut FileStore, args: SampleArgs, json: bool) -> Result<()> {
    let batch = store.batch(&args.batch)?;
    let calculator = store.knowledge_base().growth_calculator_for(&batch);

    let mut input = BiometricInput::new(
        args.batch.clone(),
        args.taken_at.unwrap_or_else(Utc::now),
        args.fish_count,
        args.total_weight,
    )
    .with_mortality(args.mortality)
    .with_feed_consumed_kg(args.feed_kg)
    .with_individual_weights(args.weights);
    if let Some(length) = args.length {
        input = input.with_measured_length_cm(length);
    }
    if let Some(population) = args.population {
        input = input.with_observed_population(population);
    }

    let sample = record_biometric(store, &calculator, input)
        .with_context(|| format!("Biometric sample for '{}' was not recorded", args.batch))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sample)?);
    } else {
        print_sample(&batch, &sample);
    }
    Ok(())
}

pub fn run_history(store: &FileStore, args: HistoryArgs, json: bool) -> Result<()> {
    let batch = store.batch(&args.batch)?;
    let history = store.samples(&batch.batch_id)?;
    let summary = summarize(&history)
        .with_context(|| format!("History of '{}' is inconsistent", batch.batch_id))?;
    let feedings = store.feedings(&batch.batch_id)?;

    if json {
        #[derive(Serialize)]
        struct HistoryOutput<'a> {
            batch: &'a BatchSnapshot,
            samples: &'a [BiometricSample],
            summary: Option<&'a GrowthSummary>,
            feedings_recorded: usize,
            feed_recorded_grams: f64,
        }
        let output = HistoryOutput {
            batch: &batch,
            samples: &history,
            summary: summary.as_ref(),
            feedings_recorded: feedings.len(),
            feed_recorded_grams: feedings.iter().map(|f| f.feed_grams).sum(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Batch {} ({}) - {} samples", batch.batch_id, batch.batch_name, history.len());
    println!(
        "{:<25} {:>9} {:>11} {:>7} {:>10} {:>7} {:>9}",
        "Taken at", "Mean (g)", "Biomass", "Pop.", "g/day", "FCR", "Survival"
    );
    for sample in &history {
        let m = &sample.metrics;
        println!(
            "{:<25} {:>9.1} {:>11} {:>7} {:>10} {:>7} {:>9}",
            sample.taken_at().format("%Y-%m-%d %H:%M UTC").to_string(),
            m.mean_weight_grams,
            format_kg(m.estimated_biomass_kg),
            m.final_population_after_mortality,
            format_optional(m.daily_growth_rate_grams_per_day, |v| format!("{:.2}", v)),
            format_optional(m.feed_conversion_ratio, |v| format!("{:.2}", v)),
            format_optional(m.survival_percent, format_percent),
        );
    }

    if !feedings.is_empty() {
        let total: f64 = feedings.iter().map(|f| f.feed_grams).sum();
        println!("\nFeedings recorded: {} ({} total)", feedings.len(), format_grams(total));
    }

    if let Some(summary) = summary {
        print_summary(&summary);
    }
    Ok(())
}

pub fn run_batches(store: &FileStore, json: bool) -> Result<()> {
    let mut batches: Vec<&BatchSnapshot> = store.knowledge_base().batches.values().collect();
    batches.sort_by(|a, b| a.batch_id.cmp(&b.batch_id));

    if json {
        println!("{}", serde_json::to_string_pretty(&batches)?);
        return Ok(());
    }

    for batch in batches {
        let survival = (batch.initial_population > 0)
            .then(|| batch.current_population as f64 / batch.initial_population as f64 * 100.0);
        println!(
            "{:<14} {:<24} {:<14} {:>7}/{:<7} survival {:>7} {:?}",
            batch.batch_id,
            batch.batch_name,
            batch.species_id,
            batch.current_population,
            batch.initial_population,
            format_optional(survival, format_percent),
            batch.status,
        );
    }
    Ok(())
}

fn print_feeding_plan(batch: &BatchSnapshot, plan: &FeedingResult) {
    println!("\n--- Feeding plan for {} ---", batch.batch_id);
    println!("  - Population:            {}", batch.current_population);
    println!("  - Biomass:               {}", format_kg(plan.biomass_kg));
    println!("  - Base feed rate:        {}", format_percent(plan.base_feed_rate_percent));
    println!("  - Temperature factor:    {:.2}", plan.temperature_factor);
    println!("  - Adjusted feed rate:    {}", format_percent(plan.adjusted_feed_rate_percent));
    println!("  - Daily ration:          {}", format_grams(plan.daily_ration_grams));
    println!("  - Frequency:             {}", plan.recommended_frequency);
}

fn print_sample(batch: &BatchSnapshot, sample: &BiometricSample) {
    let m = &sample.metrics;
    println!("\n--- Biometric sample for {} at {} ---", batch.batch_id, sample.taken_at());
    println!("  - Mean weight:           {:.2} g", m.mean_weight_grams);
    println!("  - Length:                {:.1} cm", m.estimated_length_cm);
    println!(
        "  - Population:            {} -> {}",
        sample
            .input
            .observed_current_population
            .unwrap_or(batch.current_population),
        m.final_population_after_mortality
    );
    println!("  - Biomass:               {}", format_kg(m.estimated_biomass_kg));
    println!(
        "  - Daily growth:          {}",
        format_optional(m.daily_growth_rate_grams_per_day, |v| format!("{:.2} g/day", v))
    );
    println!(
        "  - Specific growth rate:  {}",
        format_optional(m.specific_growth_rate_percent_per_day, |v| format!("{:.2} %/day", v))
    );
    println!(
        "  - FCR:                   {}",
        format_optional(m.feed_conversion_ratio, |v| format!("{:.3}", v))
    );
    println!("  - Survival:              {}", format_optional(m.survival_percent, format_percent));
    match m.uniformity {
        Uniformity::Scored {
            coefficient_of_variation_percent,
            score,
        } => println!(
            "  - Uniformity:            {:.1} (CV {})",
            score,
            format_percent(coefficient_of_variation_percent)
        ),
        Uniformity::InsufficientData => println!("  - Uniformity:            insufficient data"),
    }
}

fn print_summary(summary: &GrowthSummary) {
    println!("\n--- Growth summary ---");
    println!(
        "  - Period:                {} to {} ({:.1} days)",
        summary.first_taken_at.format("%Y-%m-%d"),
        summary.last_taken_at.format("%Y-%m-%d"),
        summary.days_covered
    );
    println!(
        "  - Mean weight:           {:.1} g -> {:.1} g",
        summary.initial_mean_weight_grams, summary.latest_mean_weight_grams
    );
    println!(
        "  - Overall growth:        {}",
        format_optional(summary.overall_daily_growth_grams_per_day, |v| format!("{:.2} g/day", v))
    );
    println!("  - Mortality:             {}", summary.total_mortality);
    println!("  - Feed:                  {}", format_kg(summary.total_feed_kg));
    println!(
        "  - Cumulative FCR:        {}",
        format_optional(summary.cumulative_feed_conversion_ratio, |v| format!("{:.3}", v))
    );
    println!("  - Biomass:               {}", format_kg(summary.latest_biomass_kg));
    println!(
        "  - Survival:              {}",
        format_optional(summary.latest_survival_percent, format_percent)
    );
}
