//! Normalization of Istanbul / NYC style per-file coverage records.
//!
//! Each file entry in a coverage map is loosely typed JSON:
//!   - `l`:      `{ "1": 5, "2": 0, ... }`: hit counts per line
//!   - `b`:      `{ "0": [5, 0], ... }`: hit counts per branch arm
//!   - `f`:      `{ "0": 3, ... }`: hit counts per function
//!   - `fnMap`:  `{ "0": { "name": "Foo.bar", ... }, ... }`
//!   - `code`:   the file's source text
//!
//! Real `coverage-final.json` output carries `statementMap` + `s` instead
//! of `l`; lines are derived from statements when `l` is unusable.
//!
//! Any field may be missing or of the wrong type. Normalization turns each
//! into a typed, possibly empty collection so the calculators never have to
//! re-check shapes.
use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};

/// Keys whose presence marks a JSON object as a per-file coverage record.
const RECORD_KEYS: [&str; 8] = ["l", "b", "f", "fnMap", "s", "statementMap", "branchMap", "code"];

/// File path → normalized record, ordered by path.
pub type CoverageMap = BTreeMap<String, FileCoverageRecord>;

/// One entry of the `l` mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineHit {
    /// Line identifier as it appeared in the input (normally a decimal line
    /// number, but not guaranteed).
    pub id: String,
    pub hit_count: u64,
}

impl LineHit {
    /// The line number, if the identifier is numeric.
    #[must_use]
    pub fn number(&self) -> Option<u32> {
        self.id.trim().parse().ok()
    }
}

/// Coverage data for a single source file, with every field validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileCoverageRecord {
    pub lines: Vec<LineHit>,
    /// Branch group identifier → hit count of every arm.
    pub branches: BTreeMap<String, Vec<u64>>,
    /// Function identifier → hit count.
    pub functions: BTreeMap<String, u64>,
    /// Function identifier → declared name.
    pub function_names: BTreeMap<String, String>,
    pub source_text: Option<String>,
}

impl FileCoverageRecord {
    /// Normalize a raw JSON entry. Anything other than an object yields an
    /// empty record.
    #[must_use]
    pub fn from_value(entry: &Value) -> Self {
        let Some(obj) = entry.as_object() else {
            return Self::default();
        };

        let lines = match obj.get("l").and_then(Value::as_object) {
            Some(l) => parse_lines(l),
            None => lines_from_statements(obj),
        };

        Self {
            lines,
            branches: parse_branches(obj.get("b")),
            functions: parse_functions(obj.get("f")),
            function_names: parse_function_names(obj.get("fnMap")),
            source_text: obj.get("code").and_then(Value::as_str).map(str::to_owned),
        }
    }

    /// Add the hits of another run over the same file. Counts for matching
    /// identifiers are summed; identifiers only present in `other` are
    /// appended.
    pub fn merge(&mut self, other: &FileCoverageRecord) {
        let mut line_index: HashMap<String, usize> = self
            .lines
            .iter()
            .enumerate()
            .map(|(i, l)| (l.id.clone(), i))
            .collect();
        for hit in &other.lines {
            match line_index.get(&hit.id) {
                Some(&i) => {
                    let line = &mut self.lines[i];
                    line.hit_count = line.hit_count.saturating_add(hit.hit_count);
                }
                None => {
                    line_index.insert(hit.id.clone(), self.lines.len());
                    self.lines.push(hit.clone());
                }
            }
        }

        for (id, arms) in &other.branches {
            let mine = self.branches.entry(id.clone()).or_default();
            if mine.len() < arms.len() {
                mine.resize(arms.len(), 0);
            }
            for (m, o) in mine.iter_mut().zip(arms) {
                *m = m.saturating_add(*o);
            }
        }

        for (id, hits) in &other.functions {
            let mine = self.functions.entry(id.clone()).or_insert(0);
            *mine = mine.saturating_add(*hits);
        }

        for (id, name) in &other.function_names {
            self.function_names
                .entry(id.clone())
                .or_insert_with(|| name.clone());
        }

        if self.source_text.is_none() {
            self.source_text.clone_from(&other.source_text);
        }
    }
}

/// Union several coverage maps, merging records that share a path.
#[must_use]
pub fn merge_maps<I>(maps: I) -> CoverageMap
where
    I: IntoIterator<Item = CoverageMap>,
{
    let mut merged = CoverageMap::new();
    for map in maps {
        for (path, record) in map {
            match merged.get_mut(&path) {
                Some(existing) => existing.merge(&record),
                None => {
                    merged.insert(path, record);
                }
            }
        }
    }
    merged
}

/// Build a coverage map from a JSON object of `{ path: record }`.
#[must_use]
pub fn coverage_map_from_object(obj: &Map<String, Value>) -> CoverageMap {
    obj.iter()
        .map(|(path, entry)| (path.clone(), FileCoverageRecord::from_value(entry)))
        .collect()
}

/// Whether a JSON value looks like a single per-file record.
#[must_use]
pub fn looks_like_record(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| RECORD_KEYS.iter().any(|k| obj.contains_key(*k)))
}

/// Interpret a JSON value as an execution count. Unsigned integers are used
/// as-is, positive fractional numbers count as executed, everything else
/// counts as zero.
fn hit_count(value: &Value) -> u64 {
    if let Some(n) = value.as_u64() {
        return n;
    }
    match value.as_f64() {
        Some(f) if f > 0.0 => f.ceil() as u64,
        _ => 0,
    }
}

fn parse_lines(l: &Map<String, Value>) -> Vec<LineHit> {
    l.iter()
        .map(|(id, count)| LineHit {
            id: id.clone(),
            hit_count: hit_count(count),
        })
        .collect()
}

/// Derive per-line hits from `statementMap` + `s`.
///
/// `statementMap` maps statement ids to `{ start: { line }, end: { line } }`
/// and `s` maps the same ids to hit counts. Several statements may start on
/// one line; the line takes the maximum.
fn lines_from_statements(obj: &Map<String, Value>) -> Vec<LineHit> {
    let (Some(stmt_map), Some(s)) = (
        obj.get("statementMap").and_then(Value::as_object),
        obj.get("s").and_then(Value::as_object),
    ) else {
        return Vec::new();
    };

    let mut line_hits: HashMap<u64, u64> = HashMap::new();
    for (idx, loc) in stmt_map {
        let Some(line) = loc
            .get("start")
            .and_then(|start| start.get("line"))
            .and_then(Value::as_u64)
        else {
            continue;
        };
        let count = s.get(idx.as_str()).map(hit_count).unwrap_or(0);
        line_hits
            .entry(line)
            .and_modify(|e| *e = (*e).max(count))
            .or_insert(count);
    }

    let mut lines: Vec<_> = line_hits.into_iter().collect();
    lines.sort_unstable_by_key(|(line, _)| *line);
    lines
        .into_iter()
        .map(|(line, hit_count)| LineHit {
            id: line.to_string(),
            hit_count,
        })
        .collect()
}

/// Branch groups from `b`. Groups that are not arrays are dropped.
fn parse_branches(b: Option<&Value>) -> BTreeMap<String, Vec<u64>> {
    let Some(b) = b.and_then(Value::as_object) else {
        return BTreeMap::new();
    };
    b.iter()
        .filter_map(|(id, arms)| {
            let arms = arms.as_array()?;
            Some((id.clone(), arms.iter().map(hit_count).collect()))
        })
        .collect()
}

fn parse_functions(f: Option<&Value>) -> BTreeMap<String, u64> {
    let Some(f) = f.and_then(Value::as_object) else {
        return BTreeMap::new();
    };
    f.iter()
        .map(|(id, count)| (id.clone(), hit_count(count)))
        .collect()
}

/// Names from `fnMap`. Entries without a string `name` are dropped.
fn parse_function_names(fn_map: Option<&Value>) -> BTreeMap<String, String> {
    let Some(fn_map) = fn_map.and_then(Value::as_object) else {
        return BTreeMap::new();
    };
    fn_map
        .iter()
        .filter_map(|(id, info)| {
            let name = info.get("name")?.as_str()?;
            Some((id.clone(), name.to_owned()))
        })
        .collect()
}
