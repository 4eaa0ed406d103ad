use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Closed set of plannable activity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    WarmUp,
    Stretching,
    Cooldown,
    Bouldering,
    Routes,
    Projecting,
    Hangboard,
    CampusBoard,
    Strength,
    TechniqueDrills,
    Custom,
}

impl ActivityType {
    /// Starting duration/intensity when an activity of this type is added
    pub fn smart_defaults(&self) -> (u32, Intensity) {
        match self {
            ActivityType::WarmUp => (15, Intensity::Light),
            ActivityType::Cooldown | ActivityType::Stretching => (10, Intensity::VeryLight),
            _ => (30, Intensity::Moderate),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    VeryLight,
    Light,
    Moderate,
    High,
    Max,
}

/// One timed entry in the structured session plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Activity {
    /// Unique within the plan, assigned at creation, never reused
    pub id: u32,
    pub activity_type: ActivityType,
    pub duration_minutes: u32,
    pub intensity: Intensity,
    /// Free text, only meaningful for `ActivityType::Custom`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Named presets for the quick-template row. The literal sequences are
/// configuration data shared with the dashboard UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlanTemplate {
    Project,
    Volume,
    Training,
    Recovery,
    ClearAll,
}

impl PlanTemplate {
    /// (type, minutes, intensity) triples the template expands to
    pub fn activities(&self) -> &'static [(ActivityType, u32, Intensity)] {
        match self {
            PlanTemplate::Project => &[
                (ActivityType::WarmUp, 15, Intensity::Light),
                (ActivityType::Bouldering, 20, Intensity::Moderate),
                (ActivityType::Projecting, 60, Intensity::High),
                (ActivityType::Cooldown, 10, Intensity::VeryLight),
            ],
            PlanTemplate::Volume => &[
                (ActivityType::WarmUp, 15, Intensity::Light),
                (ActivityType::Routes, 75, Intensity::Moderate),
                (ActivityType::Stretching, 10, Intensity::VeryLight),
            ],
            PlanTemplate::Training => &[
                (ActivityType::WarmUp, 15, Intensity::Light),
                (ActivityType::Hangboard, 25, Intensity::High),
                (ActivityType::Strength, 30, Intensity::Moderate),
                (ActivityType::Stretching, 10, Intensity::VeryLight),
            ],
            PlanTemplate::Recovery => &[
                (ActivityType::WarmUp, 10, Intensity::VeryLight),
                (ActivityType::TechniqueDrills, 20, Intensity::Light),
                (ActivityType::Stretching, 15, Intensity::VeryLight),
            ],
            PlanTemplate::ClearAll => &[],
        }
    }
}

/// Ordered, reorderable list of timed activities.
///
/// Ids are handed out from a monotonic counter and survive template swaps —
/// an id observed once is never attached to a different activity later.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionPlan {
    pub activities: Vec<Activity>,
    next_id: u32,
}

impl SessionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a plan around an existing activity list (e.g. a persisted
    /// structure being re-opened). The id counter resumes past the highest
    /// id present so ids stay unique.
    pub fn from_activities(activities: Vec<Activity>) -> Self {
        let next_id = activities.iter().map(|a| a.id + 1).max().unwrap_or(0);
        Self { activities, next_id }
    }

    /// Append a new activity with type-specific smart defaults. Returns its id.
    pub fn add(&mut self, activity_type: ActivityType) -> u32 {
        let (duration_minutes, intensity) = activity_type.smart_defaults();
        let id = self.fresh_id();
        self.activities.push(Activity {
            id,
            activity_type,
            duration_minutes,
            intensity,
            notes: None,
        });
        id
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Activity> {
        self.activities.iter_mut().find(|a| a.id == id)
    }

    /// Swap the activity with its predecessor. No-op at the top of the list
    /// or for an unknown id.
    pub fn move_up(&mut self, id: u32) {
        if let Some(pos) = self.position(id)
            && pos > 0
        {
            self.activities.swap(pos - 1, pos);
        }
    }

    /// Swap the activity with its successor. No-op at the bottom of the list
    /// or for an unknown id.
    pub fn move_down(&mut self, id: u32) {
        if let Some(pos) = self.position(id)
            && pos + 1 < self.activities.len()
        {
            self.activities.swap(pos, pos + 1);
        }
    }

    /// Delete by id. Returns whether anything was removed.
    pub fn remove(&mut self, id: u32) -> bool {
        let before = self.activities.len();
        self.activities.retain(|a| a.id != id);
        self.activities.len() != before
    }

    /// Replace the whole list atomically with a template's literal sequence.
    /// New entries get fresh ids from the same counter.
    pub fn apply_template(&mut self, template: PlanTemplate) {
        self.activities = template
            .activities()
            .iter()
            .map(|&(activity_type, duration_minutes, intensity)| Activity {
                id: self.fresh_id(),
                activity_type,
                duration_minutes,
                intensity,
                notes: None,
            })
            .collect();
    }

    /// Sum of all activity durations. Recomputed on every read.
    pub fn total_minutes(&self) -> u32 {
        self.activities.iter().map(|a| a.duration_minutes).sum()
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    fn position(&self, id: u32) -> Option<usize> {
        self.activities.iter().position(|a| a.id == id)
    }

    fn fresh_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}
