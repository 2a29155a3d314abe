use std::path::PathBuf;

use clap::Subcommand;
use repflow_core::storage::{Config, Database};
use repflow_core::SessionPlan;

#[derive(Subcommand)]
pub enum PlanAction {
    /// Print the built-in sample plan
    Sample,
    /// Show the active plan
    Show,
    /// Install a plan from a JSON file
    Use {
        /// Path to a plan JSON file
        path: PathBuf,
    },
    /// Write the active plan to a JSON file
    Export {
        /// Destination path
        path: PathBuf,
    },
}

pub fn run(action: PlanAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PlanAction::Sample => {
            println!("{}", serde_json::to_string_pretty(&SessionPlan::sample())?);
        }
        PlanAction::Show => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config.plan())?);
        }
        PlanAction::Use { path } => {
            let raw = std::fs::read_to_string(&path)?;
            let plan = SessionPlan::from_json(&raw)?;

            let mut config = Config::load()?;
            config.custom_plan = Some(plan.clone());
            config.save()?;

            // A session already underway follows the new plan immediately.
            let db = Database::open()?;
            if let Ok(Some(mut session)) = db.load_engine() {
                let event = session.replace_plan(plan)?;
                db.save_engine(&session)?;
                println!("{}", serde_json::to_string_pretty(&event)?);
            } else {
                println!("ok");
            }
        }
        PlanAction::Export { path } => {
            let config = Config::load()?;
            let json = serde_json::to_string_pretty(&config.plan())?;
            std::fs::write(&path, json)?;
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}
