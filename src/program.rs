// src/program.rs
use serde::Serialize;

/// Identifier of the program used whenever a requested one is unknown.
pub const DEFAULT_PROGRAM_ID: &str = "ppl";

/// Sentinel label for a rest day inside a week.
pub const REST_LABEL: &str = "Rest";

/// Days in a schedule week.
pub const DAYS_PER_WEEK: usize = 7;

/// A static program definition: its rotation of workout labels and its rest policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Program {
    pub id: &'static str,
    pub name: &'static str,
    pub rotation: &'static [&'static str],
    /// Maximum rest days allowed within a 7-day week.
    pub rest_limit: usize,
    /// Rest days placed by a freshly built schedule.
    pub default_rest: usize,
}

impl Program {
    /// True if `label` is one of this program's rotation labels.
    pub fn has_label(&self, label: &str) -> bool {
        self.rotation.iter().any(|l| *l == label)
    }

    /// Matches user input against the rotation, ignoring case.
    pub fn canonical_label(&self, input: &str) -> Option<&'static str> {
        let input = input.trim();
        self.rotation
            .iter()
            .copied()
            .find(|l| l.eq_ignore_ascii_case(input))
    }

    /// The rotation label tied to a position in the week.
    /// Uses `index mod rotation length`, not the sequence continuation.
    pub fn label_at(&self, index: usize) -> &'static str {
        self.rotation[index % self.rotation.len()]
    }
}

static CATALOG: &[Program] = &[
    Program {
        id: "ppl",
        name: "Push / Pull / Legs",
        rotation: &["Push", "Pull", "Legs"],
        rest_limit: 2,
        default_rest: 1,
    },
    Program {
        id: "upper_lower",
        name: "Upper / Lower",
        rotation: &["Upper", "Lower"],
        rest_limit: 3,
        default_rest: 3,
    },
    Program {
        id: "full_body",
        name: "Full Body",
        rotation: &["Full Body"],
        rest_limit: 4,
        default_rest: 4,
    },
    Program {
        id: "bro_split",
        name: "Body Part Split",
        rotation: &["Chest", "Back", "Shoulders", "Arms", "Legs"],
        rest_limit: 2,
        default_rest: 2,
    },
    Program {
        id: "arnold",
        name: "Arnold Split",
        rotation: &["Chest & Back", "Shoulders & Arms", "Legs"],
        rest_limit: 2,
        default_rest: 1,
    },
];

/// All known programs, in display order.
pub fn all() -> &'static [Program] {
    CATALOG
}

/// Looks a program up by identifier (case-insensitive, trimmed).
pub fn find(id: &str) -> Option<&'static Program> {
    let id = id.trim();
    CATALOG.iter().find(|p| p.id.eq_ignore_ascii_case(id))
}

/// Looks a program up, falling back to the push/pull/legs program for unknown ids.
pub fn resolve(id: &str) -> &'static Program {
    find(id).unwrap_or_else(|| {
        tracing::warn!(program = id, "Unknown program, falling back to '{DEFAULT_PROGRAM_ID}'");
        default_program()
    })
}

/// The push/pull/legs program.
pub fn default_program() -> &'static Program {
    &CATALOG[0]
}
