//! Result column order
//!
//! The bolt driver hands rows back as hash maps, so the order of the
//! `RETURN` projection is lost by the time a row is decoded. It is recovered
//! here from the statement text and reapplied to every decoded row.

use crate::storage::Record;

/// Column names of the last top-level `RETURN` clause, in projection order.
///
/// Returns an empty list when the statement has no top-level `RETURN` or
/// projects `*`.
pub fn return_columns(statement: &str) -> Vec<String> {
    let upper = statement.to_ascii_uppercase();
    let bytes = upper.as_bytes();
    let mask = top_level_mask(statement.as_bytes());

    let Some(start) = keyword_positions(bytes, &mask, "RETURN")
        .last()
        .map(|p| p + "RETURN".len())
    else {
        return Vec::new();
    };

    let end = ["ORDER", "SKIP", "LIMIT", "UNION"]
        .iter()
        .filter_map(|kw| keyword_positions(bytes, &mask, kw).into_iter().find(|&p| p > start))
        .chain((start..bytes.len()).find(|&i| mask[i] && bytes[i] == b';'))
        .min()
        .unwrap_or(bytes.len());

    let mut from = start;
    if let Some(&p) = keyword_positions(bytes, &mask, "DISTINCT")
        .iter()
        .find(|&&p| p >= start && p < end && statement[start..p].trim().is_empty())
    {
        from = p + "DISTINCT".len();
    }

    let mut items = Vec::new();
    let mut item_start = from;
    for i in from..end {
        if mask[i] && bytes[i] == b',' {
            items.push((item_start, i));
            item_start = i + 1;
        }
    }
    items.push((item_start, end));

    let mut columns = Vec::with_capacity(items.len());
    for (s, e) in items {
        let item = statement[s..e].trim();
        if item == "*" {
            return Vec::new();
        }
        let name = match keyword_positions(bytes, &mask, "AS")
            .into_iter()
            .filter(|&p| p > s && p < e)
            .last()
        {
            Some(p) => statement[p + "AS".len()..e].trim().trim_matches('`'),
            None => item,
        };
        if !name.is_empty() {
            columns.push(name.to_string());
        }
    }
    columns
}

/// Reorder a decoded row: known columns first in projection order, then any
/// others sorted by name.
pub fn in_column_order(mut row: Record, columns: &[String]) -> Record {
    let mut ordered = Record::new();
    for column in columns {
        if let Some(value) = row.remove(column) {
            ordered.insert(column.clone(), value);
        }
    }
    let mut rest: Vec<_> = row.into_iter().collect();
    rest.sort_by(|a, b| a.0.cmp(&b.0));
    ordered.extend(rest);
    ordered
}

/// Marks bytes outside string literals, quoted names and brackets.
fn top_level_mask(s: &[u8]) -> Vec<bool> {
    let mut mask = vec![false; s.len()];
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (i, &b) in s.iter().enumerate() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' && q != b'`' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            _ => mask[i] = depth == 0,
        }
    }
    mask
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'.')
}

/// Top-level, whole-word occurrences of an upper-case keyword.
fn keyword_positions(upper: &[u8], mask: &[bool], keyword: &str) -> Vec<usize> {
    let kw = keyword.as_bytes();
    if upper.len() < kw.len() {
        return Vec::new();
    }
    (0..=upper.len() - kw.len())
        .filter(|&i| {
            upper[i..i + kw.len()] == *kw
                && mask[i..i + kw.len()].iter().all(|&m| m)
                && (i == 0 || !is_word(upper[i - 1]))
                && upper.get(i + kw.len()).map_or(true, |&b| !is_word(b))
        })
        .collect()
}
