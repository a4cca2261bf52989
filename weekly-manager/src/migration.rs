//! Normalization of any supported on-disk shape into the canonical [`Document`].
//!
//! Four historical layouts exist for the value stored under `students[name]`.
//! Dispatch is purely structural (see [`StudentShape`]); the `version` field of
//! the input is never consulted.
//!
//! | shape | result |
//! |---|---|
//! | list | one `Standardprojekt` whose weeklies are the list |
//! | object with a `projects` list | one project per object element |
//! | object with a `weeklies` list | one project built from the object itself |
//! | anything else | a student without projects |
//!
//! Every entity is cleaned the same way regardless of the shape that carried
//! it, so migrating a canonical document is a fixed point.

use serde_json::{Map, Value};
use time::Date;

use crate::error::{LoadError, SchemaError};
use crate::time_utils::{add_days, parse_iso_date, DEFAULT_PROJECT_DAYS};
use crate::types::{
    dedup_todos, Document, Project, Student, Todo, Weekly, CURRENT_VERSION, DEFAULT_PROJECT_NAME,
};

/// Todo lists of older formats, merged in this order.
pub const TODO_BUCKETS: [&str; 3] = ["project_todos", "project_todos_active", "project_todos_later"];

/// The recognized layouts of a single student entry.
#[derive(Debug)]
enum StudentShape<'a> {
    /// `students[name] = [weekly, ...]`
    WeeklyList(&'a [Value]),
    /// `students[name] = {"projects": [...]}`
    ProjectList(&'a [Value]),
    /// `students[name] = {"name": .., "weeklies": [...], ..}`
    SingleProject(&'a Map<String, Value>),
    Unrecognized,
}

impl<'a> StudentShape<'a> {
    fn classify(value: &'a Value) -> Self {
        match value {
            Value::Array(items) => Self::WeeklyList(items),
            Value::Object(map) => match (map.get("projects"), map.get("weeklies")) {
                (Some(Value::Array(projects)), _) => Self::ProjectList(projects),
                (_, Some(Value::Array(_))) => Self::SingleProject(map),
                _ => Self::Unrecognized,
            },
            _ => Self::Unrecognized,
        }
    }
}

/// Parse raw bytes and migrate them.
pub fn migrate_bytes(bytes: &[u8], today: Date) -> Result<Document, LoadError> {
    let raw: Value = serde_json::from_slice(bytes)?;
    Ok(migrate(&raw, today)?)
}

/// Convert any JSON object into a canonical document.
///
/// `today` is the fallback for missing or unparsable "current" dates. Only a
/// non-object root is rejected; every other defect is repaired locally.
pub fn migrate(raw: &Value, today: Date) -> Result<Document, SchemaError> {
    let root = raw
        .as_object()
        .ok_or_else(|| SchemaError::RootNotObject(json_kind(raw)))?;

    if let Some(version) = root.get("version") {
        tracing::debug!(declared = %version, "ignoring declared schema version");
    }

    let mut document = Document::new();
    let students = match root.get("students") {
        Some(Value::Object(students)) => students,
        Some(other) => {
            tracing::warn!(kind = json_kind(other), "students is not an object, ignoring");
            return Ok(document);
        }
        None => return Ok(document),
    };

    for (raw_name, value) in students {
        let name = raw_name.trim();
        if name.is_empty() {
            tracing::warn!("dropping student with blank name");
            continue;
        }

        let projects = migrate_student(name, value, today);
        match document.students.get_mut(name) {
            Some(existing) => {
                tracing::warn!(student = name, "student names collide after trimming, merging");
                existing.projects.extend(projects);
            }
            None => {
                document
                    .students
                    .insert(name.to_string(), Student { projects });
            }
        }
    }

    document.version = CURRENT_VERSION;
    Ok(document)
}

fn migrate_student(name: &str, value: &Value, today: Date) -> Vec<Project> {
    match StudentShape::classify(value) {
        StudentShape::WeeklyList(items) => vec![Project {
            name: DEFAULT_PROJECT_NAME.to_string(),
            start_date: today,
            end_date: add_days(today, DEFAULT_PROJECT_DAYS),
            todos: Vec::new(),
            weeklies: clean_weeklies(items, today),
        }],
        StudentShape::ProjectList(items) => items
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| match item {
                Value::Object(raw) => Some(clean_project(raw, &format!("Projekt {}", idx + 1), today)),
                other => {
                    tracing::warn!(student = name, idx, kind = json_kind(other), "skipping non-object project");
                    None
                }
            })
            .collect(),
        StudentShape::SingleProject(raw) => vec![clean_project(raw, DEFAULT_PROJECT_NAME, today)],
        StudentShape::Unrecognized => {
            tracing::warn!(student = name, kind = json_kind(value), "unrecognized student shape, no projects kept");
            Vec::new()
        }
    }
}

fn clean_project(raw: &Map<String, Value>, fallback_name: &str, today: Date) -> Project {
    let start_date = clean_date(raw.get("start_date"), today);
    let end_date = clean_date(raw.get("end_date"), add_days(start_date, DEFAULT_PROJECT_DAYS));
    let weeklies = match raw.get("weeklies") {
        Some(Value::Array(items)) => clean_weeklies(items, today),
        _ => Vec::new(),
    };

    Project {
        name: clean_name(raw.get("name"), fallback_name),
        start_date,
        end_date,
        todos: merge_todo_buckets(raw),
        weeklies,
    }
}

fn clean_weeklies(items: &[Value], today: Date) -> Vec<Weekly> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(raw) => Some(clean_weekly(raw, today)),
            other => {
                tracing::debug!(kind = json_kind(other), "skipping non-object weekly");
                None
            }
        })
        .collect()
}

fn clean_weekly(raw: &Map<String, Value>, today: Date) -> Weekly {
    Weekly {
        date: clean_date(raw.get("date"), today),
        title: coerce_string(raw.get("title")),
        planned: coerce_string(raw.get("planned")),
        done: coerce_string(raw.get("done")),
        next_planned: coerce_string(raw.get("next_planned")),
    }
}

/// Concatenate all todo buckets in [`TODO_BUCKETS`] order and drop
/// case-insensitive duplicates across the combined list.
fn merge_todo_buckets(raw: &Map<String, Value>) -> Vec<Todo> {
    dedup_todos(
        TODO_BUCKETS
            .iter()
            .flat_map(|key| normalize_todos(raw.get(*key))),
    )
}

/// Accept bare strings (unchecked) and `{text, checked}` objects.
pub fn normalize_todos(value: Option<&Value>) -> Vec<Todo> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let (text, checked) = match item {
                Value::String(text) => (text.trim().to_string(), false),
                Value::Object(raw) => (
                    coerce_string(raw.get("text")).trim().to_string(),
                    raw.get("checked").is_some_and(truthy),
                ),
                _ => return None,
            };
            (!text.is_empty()).then_some(Todo { text, checked })
        })
        .collect()
}

fn clean_date(value: Option<&Value>, fallback: Date) -> Date {
    match value {
        Some(Value::String(text)) => parse_iso_date(text).unwrap_or_else(|| {
            tracing::debug!(value = %text, %fallback, "unparsable date, using fallback");
            fallback
        }),
        _ => fallback,
    }
}

fn clean_name(value: Option<&Value>, fallback: &str) -> String {
    match coerce_string(value).trim() {
        "" => fallback.to_string(),
        name => name.to_string(),
    }
}

/// Render a scalar as text. Absent and `null` become empty.
fn coerce_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    const TODAY: Date = date!(2024 - 05 - 01);

    fn migrate_ok(raw: Value) -> Document {
        migrate(&raw, TODAY).expect("object root should migrate")
    }

    fn only_project(doc: &Document, student: &str) -> Project {
        let projects = &doc.students[student].projects;
        assert_eq!(projects.len(), 1, "expected exactly one project");
        projects[0].clone()
    }

    #[test]
    fn weekly_list_becomes_default_project() {
        let doc = migrate_ok(json!({
            "students": {"Alice": [{"date": "2024-01-08", "done": "x"}]}
        }));

        let project = only_project(&doc, "Alice");
        assert_eq!(project.name, "Standardprojekt");
        assert_eq!(project.start_date, TODAY);
        assert_eq!(project.end_date, date!(2024 - 07 - 30));
        assert!(project.todos.is_empty());
        assert_eq!(
            project.weeklies,
            vec![Weekly {
                date: date!(2024 - 01 - 08),
                title: String::new(),
                planned: String::new(),
                done: "x".to_string(),
                next_planned: String::new(),
            }]
        );
    }

    #[test]
    fn weekly_list_skips_non_object_items() {
        let doc = migrate_ok(json!({
            "students": {"Alice": ["just text", 3, {"title": "kept"}]}
        }));

        let project = only_project(&doc, "Alice");
        assert_eq!(project.weeklies.len(), 1);
        assert_eq!(project.weeklies[0].title, "kept");
        assert_eq!(project.weeklies[0].date, TODAY);
    }

    #[test]
    fn projects_list_cleans_each_project() {
        let doc = migrate_ok(json!({
            "students": {"Bob": {"projects": [
                {"name": "  Thesis ", "start_date": "2024-02-01", "end_date": "2024-06-30",
                 "project_todos": [{"text": "Draft", "checked": true}],
                 "weeklies": [{"date": "2024-02-05", "title": "Kickoff"}]},
                "not a project",
                {"name": "", "start_date": "garbage"}
            ]}}
        }));

        let projects = &doc.students["Bob"].projects;
        assert_eq!(projects.len(), 2);

        assert_eq!(projects[0].name, "Thesis");
        assert_eq!(projects[0].start_date, date!(2024 - 02 - 01));
        assert_eq!(projects[0].end_date, date!(2024 - 06 - 30));
        assert_eq!(
            projects[0].todos,
            vec![Todo {
                text: "Draft".to_string(),
                checked: true
            }]
        );
        assert_eq!(projects[0].weeklies[0].title, "Kickoff");

        // Fallback name uses the position in the raw list.
        assert_eq!(projects[1].name, "Projekt 3");
        assert_eq!(projects[1].start_date, TODAY);
        assert_eq!(projects[1].end_date, add_days(TODAY, 90));
        assert!(projects[1].weeklies.is_empty());
    }

    #[test]
    fn end_date_falls_back_to_start_plus_90_days() {
        let doc = migrate_ok(json!({
            "students": {"Bob": {"projects": [{"name": "P", "start_date": "2024-01-01"}]}}
        }));
        assert_eq!(only_project(&doc, "Bob").end_date, date!(2024 - 03 - 31));
    }

    #[test]
    fn weeklies_object_becomes_single_project() {
        let doc = migrate_ok(json!({
            "students": {"Carol": {
                "name": "Robotics",
                "start_date": "2023-10-01",
                "end_date": "2024-03-01",
                "weeklies": [{"date": "2023-10-09", "planned": "setup"}],
                "project_todos": ["Order parts"],
                "project_todos_later": [{"text": "Write report", "checked": false}]
            }}
        }));

        let project = only_project(&doc, "Carol");
        assert_eq!(project.name, "Robotics");
        assert_eq!(project.start_date, date!(2023 - 10 - 01));
        assert_eq!(project.end_date, date!(2024 - 03 - 01));
        assert_eq!(project.weeklies[0].planned, "setup");
        assert_eq!(
            project.todos,
            vec![Todo::open("Order parts"), Todo::open("Write report")]
        );
    }

    #[test]
    fn weeklies_object_without_name_uses_default_name() {
        let doc = migrate_ok(json!({"students": {"Carol": {"weeklies": []}}}));
        assert_eq!(only_project(&doc, "Carol").name, "Standardprojekt");
    }

    #[test]
    fn non_list_projects_falls_through_to_weeklies() {
        let doc = migrate_ok(json!({
            "students": {"Dan": {"projects": "broken", "weeklies": [{"title": "w"}]}}
        }));
        assert_eq!(only_project(&doc, "Dan").weeklies[0].title, "w");
    }

    #[test]
    fn unrecognized_shapes_keep_student_without_projects() {
        let doc = migrate_ok(json!({
            "students": {"Eve": {"notes": "?"}, "Finn": 42, "Gus": null}
        }));
        for name in ["Eve", "Finn", "Gus"] {
            assert!(doc.students[name].projects.is_empty(), "{name} should be empty");
        }
    }

    #[test]
    fn todo_buckets_merge_in_order_without_duplicates() {
        let doc = migrate_ok(json!({
            "students": {"Alice": {"projects": [{
                "name": "P",
                "project_todos": ["Read ch1"],
                "project_todos_active": ["read CH1 "],
                "project_todos_later": ["Read ch2"]
            }]}}
        }));
        assert_eq!(
            only_project(&doc, "Alice").todos,
            vec![Todo::open("Read ch1"), Todo::open("Read ch2")]
        );
    }

    #[test]
    fn todo_checked_state_follows_first_occurrence() {
        let doc = migrate_ok(json!({
            "students": {"Alice": {"projects": [{
                "project_todos_active": [{"text": "Ship", "checked": 1}],
                "project_todos_later": [{"text": "ship", "checked": false}, {"text": "  "}, 7]
            }]}}
        }));
        assert_eq!(
            only_project(&doc, "Alice").todos,
            vec![Todo {
                text: "Ship".to_string(),
                checked: true
            }]
        );
    }

    #[test]
    fn version_is_always_stamped_current() {
        for declared in [json!(1), json!(99), json!("four"), Value::Null] {
            let doc = migrate_ok(json!({"version": declared, "students": {}}));
            assert_eq!(doc.version, CURRENT_VERSION);
        }
    }

    #[test]
    fn declared_version_does_not_drive_dispatch() {
        // A version-4 header on a version-1 body still migrates structurally.
        let doc = migrate_ok(json!({
            "version": 4,
            "students": {"Alice": [{"date": "2024-01-08"}]}
        }));
        assert_eq!(only_project(&doc, "Alice").name, "Standardprojekt");
    }

    #[test]
    fn non_object_root_is_a_schema_error() {
        assert_eq!(
            migrate(&json!([1, 2]), TODAY),
            Err(SchemaError::RootNotObject("array"))
        );
        assert_eq!(
            migrate(&json!("text"), TODAY),
            Err(SchemaError::RootNotObject("string"))
        );
    }

    #[test]
    fn missing_or_invalid_students_yield_empty_document() {
        assert!(migrate_ok(json!({})).students.is_empty());
        assert!(migrate_ok(json!({"students": [1, 2]})).students.is_empty());
    }

    #[test]
    fn student_names_are_trimmed_and_merged() {
        let doc = migrate_ok(json!({
            "students": {
                "Alice": {"projects": [{"name": "A1"}]},
                " Alice ": {"projects": [{"name": "A2"}]},
                "   ": []
            }
        }));
        assert_eq!(doc.students.len(), 1);
        let names: Vec<_> = doc.students["Alice"]
            .projects
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["A2", "A1"]);
    }

    #[test]
    fn scalar_fields_are_coerced_to_text() {
        let doc = migrate_ok(json!({
            "students": {"Alice": [{"title": 12, "done": true, "planned": null}]}
        }));
        let weekly = &only_project(&doc, "Alice").weeklies[0];
        assert_eq!(weekly.title, "12");
        assert_eq!(weekly.done, "true");
        assert_eq!(weekly.planned, "");
    }

    #[test]
    fn migration_is_idempotent() {
        let inputs = [
            json!({"students": {"Alice": [{"date": "2024-01-08", "done": "x"}, "junk"]}}),
            json!({"version": 2, "students": {"Bob": {
                "weeklies": [{"date": "bad"}],
                "project_todos": ["a", "A"],
                "project_todos_active": [{"text": "b", "checked": true}]
            }}}),
            json!({"students": {"Carol": {"projects": [{}, {"name": " x ", "end_date": "2020-01-01"}]},
                                "Dan": 5}}),
        ];

        for input in inputs {
            let first = migrate_ok(input);
            let bytes = serde_json::to_vec(&first).unwrap();
            let second = migrate_bytes(&bytes, TODAY).unwrap();
            assert_eq!(second, first);
        }
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = migrate_bytes(b"{not json", TODAY).unwrap_err();
        assert!(matches!(err, LoadError::Json(_)));
    }
}
