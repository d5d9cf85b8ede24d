use clap::ValueEnum;
use colored::Colorize;

use crate::error::Result;
use crate::model::{Task, TaskListing};
use crate::store::tasks::MoveOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Pretty,
    Minimal,
}

pub fn print_task(task: &Task, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(&task)?),
        Format::Pretty => {
            println!(
                "{} {}",
                format!("[{}]", task.id).cyan().bold(),
                task.name.bold()
            );
            println!("  {} {}", "cost:".dimmed(), task.cost);
            println!("  {} {}", "due:".dimmed(), task.due_date);
            println!("  {} {}", "order:".dimmed(), task.display_order);
        }
        Format::Minimal => println!("{}", minimal_row(task)),
    }
    Ok(())
}

pub fn truncate_name(name: &str, max_len: usize) -> String {
    if name.chars().count() > max_len {
        let truncated: String = name.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    } else {
        name.to_string()
    }
}

fn minimal_row(task: &Task) -> String {
    format!(
        "{:>4} {:24} {:>12} {}",
        task.id,
        truncate_name(&task.name, 24),
        task.cost.to_string(),
        task.due_date
    )
}

pub fn print_listing(listing: &TaskListing, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(listing)?),
        Format::Pretty => {
            if listing.tasks.is_empty() {
                println!("{}", "No tasks.".dimmed());
            }
            for (pos, task) in listing.tasks.iter().enumerate() {
                println!(
                    "{:>3}. {} {}  {}  {}",
                    pos + 1,
                    format!("[{}]", task.id).cyan(),
                    task.name.bold(),
                    task.cost.to_string().green(),
                    format!("due {}", task.due_date).dimmed()
                );
            }
            println!("{} {}", "total:".bold(), listing.total.to_string().green());
        }
        Format::Minimal => {
            println!("{:>4} {:24} {:>12} DUE", "ID", "NAME", "COST");
            println!("{}", "-".repeat(54));
            for task in &listing.tasks {
                println!("{}", minimal_row(task));
            }
            println!("{}", "-".repeat(54));
            println!("{:>4} {:24} {:>12}", "", "TOTAL", listing.total.to_string());
        }
    }
    Ok(())
}

pub fn print_move(outcome: &MoveOutcome, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(outcome)?),
        Format::Pretty => match outcome {
            MoveOutcome::Swapped { task, neighbor } => println!(
                "Moved '{}' to position {} (swapped with '{}')",
                task.name.cyan().bold(),
                task.display_order,
                neighbor.name.cyan()
            ),
            MoveOutcome::Unchanged { task } => println!(
                "{}",
                format!("'{}' is already at the edge of the list.", task.name).dimmed()
            ),
        },
        Format::Minimal => println!(
            "{} {}",
            outcome.task().id,
            if outcome.moved() { "moved" } else { "unchanged" }
        ),
    }
    Ok(())
}
