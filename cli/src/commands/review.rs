use clap::Subcommand;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crux_core::completion::compute_completion;
use crux_core::counterfactual::{VARIABLE_CATALOG, is_catalog_variable};
use crux_core::draft::{KEY_DRIVER_SLOTS, ReviewDraft};
use crux_core::plan::{ActivityType, Intensity, PlanTemplate};
use crux_core::response::{Confidence, Direction, Importance, SessionType, TreatmentKey};
use crux_core::review::{ReviewError, ReviewSession};
use crux_core::scenario::Scenario;

use crate::store::HttpStore;
use crate::util::{
    exit_error, parse_enum, print_json, read_panel_file, remove_panel_file, write_panel_file,
};

/// On-disk form of an open review panel. One panel at a time; opening a new
/// scenario replaces it (same cheap-cancel semantics as closing the dialog).
#[derive(Serialize, Deserialize)]
pub struct ReviewPanel {
    pub scenario: Scenario,
    pub draft: ReviewDraft,
}

#[derive(Subcommand)]
pub enum ReviewCommands {
    /// Open a scenario for review (seeds from your prior response, if any)
    Open {
        /// Scenario id
        #[arg(long)]
        scenario: Uuid,
    },
    /// Show the open panel: scenario, draft and section completion
    Show,
    /// Section 1 — outcome predictions
    Predict {
        /// Predicted quality under your recommendation (1..=10, steps of 0.5)
        #[arg(long)]
        optimal: Option<f64>,
        /// Predicted quality if the climber trains as planned
        #[arg(long)]
        baseline: Option<f64>,
        /// high, medium or low
        #[arg(long, value_parser = parse_enum::<Confidence>)]
        confidence: Option<Confidence>,
    },
    /// Section 2 — recommended session type
    SessionType {
        /// project, limit_bouldering, volume, technique, training,
        /// light_session, rest_day or active_recovery
        #[arg(long = "type", value_parser = parse_enum::<SessionType>)]
        session_type: SessionType,
        #[arg(long, value_parser = parse_enum::<Confidence>)]
        confidence: Option<Confidence>,
    },
    /// Section 3 — treatment advice for one lever
    Treatment {
        /// caffeine, warmup_duration, session_intensity or timing
        #[arg(long, value_parser = parse_enum::<TreatmentKey>)]
        key: TreatmentKey,
        /// Concrete advice (e.g. "one espresso", "30")
        #[arg(long)]
        value: String,
        /// critical, helpful, neutral or avoid
        #[arg(long, value_parser = parse_enum::<Importance>)]
        importance: Importance,
    },
    /// Section 4 — counterfactual judgments
    Cf {
        #[command(subcommand)]
        command: CfCommands,
    },
    /// Section 5 — set a ranked key driver
    Driver {
        /// Slot rank (1..=3)
        #[arg(long)]
        rank: usize,
        /// Situational variable name
        #[arg(long)]
        variable: String,
        /// positive or negative
        #[arg(long, default_value = "positive", value_parser = parse_enum::<Direction>)]
        direction: Direction,
    },
    /// Section 5 — empty a ranked slot
    DriverClear {
        #[arg(long)]
        rank: usize,
    },
    /// Section 6 — interaction effects
    Interaction {
        #[command(subcommand)]
        command: InteractionCommands,
    },
    /// Section 7 — structured session plan
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Section 8 — free-text reasoning
    Reasoning {
        #[arg(long)]
        text: String,
    },
    /// Persist the draft (no completion gate, panel stays open)
    Save,
    /// Submit the final response (requires sections 1, 2, 5 and 8)
    Submit,
    /// Close the panel and discard all unsaved edits
    Discard,
}

#[derive(Subcommand)]
pub enum CfCommands {
    /// Add an entry; the actual value is read from the scenario snapshot
    Add {
        /// Variable from the situational catalog
        #[arg(long)]
        variable: String,
        /// The hypothesized value
        #[arg(long)]
        hypothetical: Option<String>,
        /// Predicted quality under the hypothesis (1..=10, steps of 0.5)
        #[arg(long)]
        quality: Option<f64>,
        /// Would this change your recommended session type?
        #[arg(long)]
        would_change_type: bool,
    },
    /// Remove an entry by position (0-based)
    Remove {
        #[arg(long)]
        index: usize,
    },
}

#[derive(Subcommand)]
pub enum InteractionCommands {
    Add {
        #[arg(long)]
        first: String,
        #[arg(long)]
        second: String,
        #[arg(long)]
        description: String,
        /// Recommendation when both factors are present
        #[arg(long)]
        combined_impact: Option<String>,
    },
    Remove {
        #[arg(long)]
        index: usize,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Include the structured plan in the response
    Enable,
    /// Drop the structured plan from the response (the list is kept)
    Disable,
    /// Append an activity with type-specific defaults
    Add {
        /// warm_up, stretching, cooldown, bouldering, routes, projecting,
        /// hangboard, campus_board, strength, technique_drills or custom
        #[arg(long = "type", value_parser = parse_enum::<ActivityType>)]
        activity_type: ActivityType,
    },
    /// Edit an activity
    Set {
        #[arg(long)]
        id: u32,
        #[arg(long)]
        minutes: Option<u32>,
        /// very_light, light, moderate, high or max
        #[arg(long, value_parser = parse_enum::<Intensity>)]
        intensity: Option<Intensity>,
        /// Only meaningful for custom activities
        #[arg(long)]
        notes: Option<String>,
    },
    MoveUp {
        #[arg(long)]
        id: u32,
    },
    MoveDown {
        #[arg(long)]
        id: u32,
    },
    Remove {
        #[arg(long)]
        id: u32,
    },
    /// Replace the list with a preset (project, volume, training, recovery, clear_all)
    Template {
        #[arg(long, value_parser = parse_enum::<PlanTemplate>)]
        name: PlanTemplate,
    },
}

pub async fn run(
    api_url: &str,
    expert_id: Uuid,
    command: ReviewCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        ReviewCommands::Open { scenario } => open(api_url, expert_id, scenario).await,
        ReviewCommands::Show => {
            let panel: ReviewPanel = read_panel_file()?;
            print_panel(&panel);
            Ok(())
        }
        ReviewCommands::Save => save(api_url).await,
        ReviewCommands::Submit => submit(api_url).await,
        ReviewCommands::Discard => {
            let removed = remove_panel_file()?;
            print_json(&json!({ "discarded": removed }));
            Ok(())
        }
        other => edit(other),
    }
}

async fn open(
    api_url: &str,
    expert_id: Uuid,
    scenario_id: Uuid,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = HttpStore::new(api_url);
    let session = ReviewSession::open(&store, scenario_id, expert_id).await?;

    let panel = ReviewPanel {
        scenario: session.scenario,
        draft: session.draft,
    };
    write_panel_file(&panel)?;
    print_panel(&panel);
    Ok(())
}

async fn save(api_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let panel: ReviewPanel = read_panel_file()?;
    let mut session = ReviewSession::from_parts(panel.scenario, panel.draft);
    let store = HttpStore::new(api_url);

    match session.save_draft(&store).await {
        Ok(response) => {
            // The panel stays open; keep its scenario status in step with
            // the store (a first save advances pending → in_review)
            let panel = ReviewPanel {
                scenario: session.scenario,
                draft: session.draft,
            };
            write_panel_file(&panel)?;
            print_json(&json!({
                "saved": "draft",
                "scenario_id": response.scenario_id,
                "scenario_status": panel.scenario.status,
                "is_complete": response.is_complete,
                "response_duration_seconds": response.response_duration_seconds,
            }));
            Ok(())
        }
        Err(err) => exit_error(
            &err.to_string(),
            Some("Your draft is retained locally; fix the issue and run `crux review save` again"),
        ),
    }
}

async fn submit(api_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let panel: ReviewPanel = read_panel_file()?;
    let mut session = ReviewSession::from_parts(panel.scenario, panel.draft);
    let store = HttpStore::new(api_url);

    match session.submit(&store).await {
        Ok(response) => {
            // Only a successful submit closes the panel
            remove_panel_file()?;
            print_json(&json!({
                "submitted": true,
                "scenario_id": response.scenario_id,
                "scenario_status": session.scenario.status,
                "response_duration_seconds": response.response_duration_seconds,
            }));
            Ok(())
        }
        Err(err @ ReviewError::IncompleteResponse { .. }) => exit_error(
            &err.to_string(),
            Some("Run `crux review show` to see which sections are still open. Drafts can be saved at any time with `crux review save`."),
        ),
        Err(err) => exit_error(
            &err.to_string(),
            Some("Your draft is retained locally; fix the issue and run `crux review submit` again"),
        ),
    }
}

/// All local edits: mutate the draft, recompute completion, persist the panel
fn edit(command: ReviewCommands) -> Result<(), Box<dyn std::error::Error>> {
    let mut panel: ReviewPanel = read_panel_file()?;
    let ReviewPanel { scenario, draft } = &mut panel;

    match command {
        ReviewCommands::Predict {
            optimal,
            baseline,
            confidence,
        } => {
            if let Some(v) = optimal {
                draft.predicted_quality_optimal = v;
            }
            if let Some(v) = baseline {
                draft.predicted_quality_baseline = v;
            }
            if let Some(c) = confidence {
                draft.prediction_confidence = c;
            }
        }
        ReviewCommands::SessionType {
            session_type,
            confidence,
        } => {
            draft.recommended_session_type = Some(session_type);
            if let Some(c) = confidence {
                draft.session_type_confidence = c;
            }
        }
        ReviewCommands::Treatment {
            key,
            value,
            importance,
        } => {
            draft.set_treatment(key, &value, importance);
        }
        ReviewCommands::Cf { command } => match command {
            CfCommands::Add {
                variable,
                hypothetical,
                quality,
                would_change_type,
            } => {
                if !is_catalog_variable(&variable) {
                    exit_error(
                        &format!("'{variable}' is not a situational variable"),
                        Some(&format!("One of: {}", VARIABLE_CATALOG.join(", "))),
                    );
                }
                let entry = draft.add_counterfactual();
                entry.select_variable(&variable, &scenario.pre_session_snapshot);
                if let Some(h) = hypothetical {
                    entry.hypothetical_value = h;
                }
                if let Some(q) = quality {
                    entry.new_predicted_quality = q;
                }
                entry.would_change_session_type = would_change_type;
            }
            CfCommands::Remove { index } => draft.remove_counterfactual(index),
        },
        ReviewCommands::Driver {
            rank,
            variable,
            direction,
        } => {
            if !(1..=KEY_DRIVER_SLOTS).contains(&rank) {
                exit_error(
                    &format!("rank must be between 1 and {KEY_DRIVER_SLOTS}"),
                    None,
                );
            }
            draft.set_key_driver(rank, &variable, direction);
        }
        ReviewCommands::DriverClear { rank } => {
            if !(1..=KEY_DRIVER_SLOTS).contains(&rank) {
                exit_error(
                    &format!("rank must be between 1 and {KEY_DRIVER_SLOTS}"),
                    None,
                );
            }
            draft.clear_key_driver(rank);
        }
        ReviewCommands::Interaction { command } => match command {
            InteractionCommands::Add {
                first,
                second,
                description,
                combined_impact,
            } => {
                let effect = draft.add_interaction_effect();
                effect.first_factor = first;
                effect.second_factor = second;
                effect.description = description;
                effect.combined_impact = combined_impact.unwrap_or_default();
            }
            InteractionCommands::Remove { index } => draft.remove_interaction_effect(index),
        },
        ReviewCommands::Plan { command } => match command {
            PlanCommands::Enable => draft.include_session_structure = true,
            PlanCommands::Disable => draft.include_session_structure = false,
            PlanCommands::Add { activity_type } => {
                draft.plan.add(activity_type);
            }
            PlanCommands::Set {
                id,
                minutes,
                intensity,
                notes,
            } => match draft.plan.get_mut(id) {
                Some(activity) => {
                    if let Some(m) = minutes {
                        activity.duration_minutes = m;
                    }
                    if let Some(i) = intensity {
                        activity.intensity = i;
                    }
                    if let Some(n) = notes {
                        activity.notes = Some(n);
                    }
                }
                None => exit_error(&format!("No activity with id {id}"), None),
            },
            PlanCommands::MoveUp { id } => draft.plan.move_up(id),
            PlanCommands::MoveDown { id } => draft.plan.move_down(id),
            PlanCommands::Remove { id } => {
                draft.plan.remove(id);
            }
            PlanCommands::Template { name } => draft.plan.apply_template(name),
        },
        ReviewCommands::Reasoning { text } => draft.reasoning = text,
        // Open/Show/Save/Submit/Discard are handled in run()
        _ => unreachable!("non-edit command routed to edit()"),
    }

    write_panel_file(&panel)?;
    print_completion(&panel);
    Ok(())
}

fn print_completion(panel: &ReviewPanel) {
    let completion = compute_completion(&panel.draft);
    print_json(&json!({
        "scenario_id": panel.scenario.id,
        "sections_complete": completion.sections,
        "required_complete": completion.required_complete(),
        "plan_total_minutes": panel.draft.plan.total_minutes(),
        "plan_activities": panel.draft.plan.len(),
    }));
}

fn print_panel(panel: &ReviewPanel) {
    let completion = compute_completion(&panel.draft);
    print_json(&json!({
        "scenario": panel.scenario,
        "draft": panel.draft,
        "sections_complete": completion.sections,
        "required_complete": completion.required_complete(),
    }));
}
