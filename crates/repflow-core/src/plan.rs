//! Session plan model: sections -> exercises -> sets.
//!
//! The plan is built by the planner collaborator (UI, file import) and
//! handed to the engine as a snapshot. It is validated loudly at
//! construction time; once inside the engine it is treated as read-only.
//! In-session edits produce a fresh snapshot via
//! [`crate::session::WorkoutSession::replace_plan`].

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// One prescribed unit of work within an exercise.
///
/// The owning [`Exercise`] is time-based iff its sets are `Timed`; the two
/// shapes never mix within one exercise (enforced by [`SessionPlan::validate`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SetSpec {
    /// Hold/perform for a fixed duration, then rest.
    Timed {
        work_secs: u32,
        #[serde(default)]
        rest_secs: u32,
    },
    /// Lift a weight for a number of reps, then rest.
    Reps {
        #[serde(default)]
        weight_kg: f64,
        reps: u32,
        #[serde(default)]
        rest_secs: u32,
    },
}

impl SetSpec {
    pub fn is_timed(&self) -> bool {
        matches!(self, SetSpec::Timed { .. })
    }

    /// Work duration for timed sets; `None` for rep-based sets, which have
    /// no work timer.
    pub fn work_secs(&self) -> Option<u32> {
        match self {
            SetSpec::Timed { work_secs, .. } => Some(*work_secs),
            SetSpec::Reps { .. } => None,
        }
    }

    /// Rest duration after the set. Zero is allowed.
    pub fn rest_secs(&self) -> u32 {
        match self {
            SetSpec::Timed { rest_secs, .. } | SetSpec::Reps { rest_secs, .. } => *rest_secs,
        }
    }
}

/// A named exercise with its ordered sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub sets: Vec<SetSpec>,
}

impl Exercise {
    /// Whether this exercise runs on a work timer. Derived from the set
    /// shape; validation guarantees all sets agree.
    pub fn is_timed(&self) -> bool {
        self.sets.first().is_some_and(SetSpec::is_timed)
    }

    pub fn set_count(&self) -> usize {
        self.sets.len()
    }
}

/// A named group of exercises, e.g. "Warm-up" or "Strength".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub exercises: Vec<Exercise>,
}

impl Section {
    pub fn exercise_count(&self) -> usize {
        self.exercises.len()
    }
}

/// The full nested workout structure driving a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPlan {
    pub sections: Vec<Section>,
}

impl SessionPlan {
    /// Build a plan, failing loudly on invariant violations.
    pub fn new(sections: Vec<Section>) -> Result<Self, PlanError> {
        let plan = Self { sections };
        plan.validate()?;
        Ok(plan)
    }

    /// Parse a plan from JSON (planner-UI hand-off format) and validate it.
    pub fn from_json(json: &str) -> Result<Self, PlanError> {
        let plan: Self =
            serde_json::from_str(json).map_err(|e| PlanError::Malformed(e.to_string()))?;
        plan.validate()?;
        Ok(plan)
    }

    /// Check the data-model invariants: non-empty sections, at least one
    /// set per exercise, homogeneous set kinds, positive work durations.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.sections.is_empty() {
            return Err(PlanError::NoSections);
        }
        for section in &self.sections {
            if section.exercises.is_empty() {
                return Err(PlanError::EmptySection {
                    section: section.name.clone(),
                });
            }
            for exercise in &section.exercises {
                let Some(first) = exercise.sets.first() else {
                    return Err(PlanError::NoSets {
                        exercise: exercise.name.clone(),
                    });
                };
                let timed = first.is_timed();
                for (set_index, set) in exercise.sets.iter().enumerate() {
                    if set.is_timed() != timed {
                        return Err(PlanError::MixedSetKinds {
                            exercise: exercise.name.clone(),
                        });
                    }
                    match set {
                        SetSpec::Timed { work_secs, .. } if *work_secs == 0 => {
                            return Err(PlanError::ZeroWorkDuration {
                                exercise: exercise.name.clone(),
                                set_index,
                            });
                        }
                        SetSpec::Reps { weight_kg, .. } if *weight_kg < 0.0 => {
                            return Err(PlanError::NegativeWeight {
                                exercise: exercise.name.clone(),
                                set_index,
                            });
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    pub fn exercise(&self, section: usize, exercise: usize) -> Option<&Exercise> {
        self.sections.get(section)?.exercises.get(exercise)
    }

    pub fn set(&self, section: usize, exercise: usize, set: usize) -> Option<&SetSpec> {
        self.exercise(section, exercise)?.sets.get(set)
    }

    /// Total number of sets across the whole plan.
    pub fn total_sets(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| &s.exercises)
            .map(Exercise::set_count)
            .sum()
    }

    /// The built-in demo plan used by the CLI and tests.
    pub fn sample() -> Self {
        Self {
            sections: vec![
                Section {
                    name: "Warm-up".into(),
                    exercises: vec![
                        Exercise {
                            name: "Jumping Jacks".into(),
                            notes: None,
                            sets: vec![
                                SetSpec::Timed {
                                    work_secs: 45,
                                    rest_secs: 15,
                                },
                                SetSpec::Timed {
                                    work_secs: 45,
                                    rest_secs: 15,
                                },
                            ],
                        },
                        Exercise {
                            name: "Arm Circles".into(),
                            notes: Some("Both directions".into()),
                            sets: vec![SetSpec::Timed {
                                work_secs: 30,
                                rest_secs: 10,
                            }],
                        },
                    ],
                },
                Section {
                    name: "Strength".into(),
                    exercises: vec![
                        Exercise {
                            name: "Goblet Squat".into(),
                            notes: None,
                            sets: vec![
                                SetSpec::Reps {
                                    weight_kg: 24.0,
                                    reps: 10,
                                    rest_secs: 90,
                                },
                                SetSpec::Reps {
                                    weight_kg: 24.0,
                                    reps: 10,
                                    rest_secs: 90,
                                },
                                SetSpec::Reps {
                                    weight_kg: 24.0,
                                    reps: 8,
                                    rest_secs: 90,
                                },
                            ],
                        },
                        Exercise {
                            name: "Push-up".into(),
                            notes: Some("Full range, chest to floor".into()),
                            sets: vec![
                                SetSpec::Reps {
                                    weight_kg: 0.0,
                                    reps: 12,
                                    rest_secs: 60,
                                },
                                SetSpec::Reps {
                                    weight_kg: 0.0,
                                    reps: 12,
                                    rest_secs: 60,
                                },
                            ],
                        },
                    ],
                },
                Section {
                    name: "Core".into(),
                    exercises: vec![Exercise {
                        name: "Plank".into(),
                        notes: None,
                        sets: vec![
                            SetSpec::Timed {
                                work_secs: 30,
                                rest_secs: 15,
                            },
                            SetSpec::Timed {
                                work_secs: 30,
                                rest_secs: 15,
                            },
                            SetSpec::Timed {
                                work_secs: 45,
                                rest_secs: 15,
                            },
                        ],
                    }],
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed_exercise(name: &str, sets: usize) -> Exercise {
        Exercise {
            name: name.into(),
            notes: None,
            sets: (0..sets)
                .map(|_| SetSpec::Timed {
                    work_secs: 30,
                    rest_secs: 15,
                })
                .collect(),
        }
    }

    #[test]
    fn sample_plan_is_valid() {
        let plan = SessionPlan::sample();
        assert!(plan.validate().is_ok());
        assert_eq!(plan.section_count(), 3);
        assert_eq!(plan.total_sets(), 11);
    }

    #[test]
    fn empty_plan_rejected() {
        assert_eq!(SessionPlan::new(vec![]), Err(PlanError::NoSections));
    }

    #[test]
    fn empty_section_rejected() {
        let err = SessionPlan::new(vec![Section {
            name: "Hollow".into(),
            exercises: vec![],
        }])
        .unwrap_err();
        assert!(matches!(err, PlanError::EmptySection { .. }));
    }

    #[test]
    fn mixed_set_kinds_rejected() {
        let err = SessionPlan::new(vec![Section {
            name: "Bad".into(),
            exercises: vec![Exercise {
                name: "Frankenstein".into(),
                notes: None,
                sets: vec![
                    SetSpec::Timed {
                        work_secs: 30,
                        rest_secs: 0,
                    },
                    SetSpec::Reps {
                        weight_kg: 20.0,
                        reps: 8,
                        rest_secs: 60,
                    },
                ],
            }],
        }])
        .unwrap_err();
        assert_eq!(
            err,
            PlanError::MixedSetKinds {
                exercise: "Frankenstein".into()
            }
        );
    }

    #[test]
    fn zero_work_duration_rejected() {
        let err = SessionPlan::new(vec![Section {
            name: "Bad".into(),
            exercises: vec![Exercise {
                name: "Blink".into(),
                notes: None,
                sets: vec![SetSpec::Timed {
                    work_secs: 0,
                    rest_secs: 10,
                }],
            }],
        }])
        .unwrap_err();
        assert!(matches!(err, PlanError::ZeroWorkDuration { set_index: 0, .. }));
    }

    #[test]
    fn exercise_kind_derived_from_sets() {
        let plan = SessionPlan::sample();
        assert!(plan.exercise(0, 0).unwrap().is_timed());
        assert!(!plan.exercise(1, 0).unwrap().is_timed());
    }

    #[test]
    fn set_lookup_out_of_range_is_none() {
        let plan = SessionPlan::sample();
        assert!(plan.set(0, 0, 0).is_some());
        assert!(plan.set(9, 0, 0).is_none());
        assert!(plan.set(0, 9, 0).is_none());
        assert!(plan.set(0, 0, 9).is_none());
    }

    #[test]
    fn set_spec_serializes_tagged() {
        let json = serde_json::to_string(&SetSpec::Timed {
            work_secs: 30,
            rest_secs: 15,
        })
        .unwrap();
        assert!(json.contains("\"kind\":\"timed\""));

        let back: SetSpec = serde_json::from_str(&json).unwrap();
        assert!(back.is_timed());
        assert_eq!(back.rest_secs(), 15);
    }

    #[test]
    fn from_json_validates() {
        let json = serde_json::to_string(&SessionPlan::sample()).unwrap();
        assert!(SessionPlan::from_json(&json).is_ok());

        let bad = r#"{"sections":[]}"#;
        assert_eq!(SessionPlan::from_json(bad), Err(PlanError::NoSections));
    }

    #[test]
    fn helper_counts() {
        let section = Section {
            name: "S".into(),
            exercises: vec![timed_exercise("A", 2), timed_exercise("B", 3)],
        };
        assert_eq!(section.exercise_count(), 2);
        let plan = SessionPlan::new(vec![section]).unwrap();
        assert_eq!(plan.total_sets(), 5);
    }
}
