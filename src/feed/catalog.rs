//! Search and detail helpers for the record list.

use super::types::Record;

/// A labelled field shown in a record's detail view
#[derive(Clone, Copy)]
pub struct Field {
  pub label: &'static str,
  pub get: fn(&Record) -> &str,
}

/// Detail view fields, in display order. `name` and `image` are shown
/// elsewhere.
pub const DETAIL_FIELDS: &[Field] = &[
  Field {
    label: "Height",
    get: |r| r.height.as_str(),
  },
  Field {
    label: "Mass",
    get: |r| r.mass.as_str(),
  },
  Field {
    label: "Hair Color",
    get: |r| r.hair_color.as_str(),
  },
  Field {
    label: "Skin Color",
    get: |r| r.skin_color.as_str(),
  },
  Field {
    label: "Eye Color",
    get: |r| r.eye_color.as_str(),
  },
  Field {
    label: "Birth Year",
    get: |r| r.birth_year.as_str(),
  },
  Field {
    label: "Gender",
    get: |r| r.gender.as_str(),
  },
];

/// Render "Label: value" lines for the detail view
pub fn detail_lines(record: &Record) -> Vec<String> {
  DETAIL_FIELDS
    .iter()
    .map(|field| format!("{}: {}", field.label, (field.get)(record)))
    .collect()
}

/// Records whose name contains `search` (case-sensitive). An empty search
/// matches everything.
pub fn filter_records<'a>(records: &'a [Record], search: &str) -> Vec<&'a Record> {
  records
    .iter()
    .filter(|r| search.is_empty() || r.name.contains(search))
    .collect()
}

/// First record with exactly this name
pub fn find_record<'a>(records: &'a [Record], name: &str) -> Option<&'a Record> {
  records.iter().find(|r| r.name == name)
}
