//! Poll attachments on feed entries.
//!
//! Votes appear under several keys depending on where the entry was
//! created, with different field names for the same data.

use serde::Serialize;
use serde_json::Value;

use crate::fallback::{first_nonzero_i64, first_present, first_str};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vote {
    pub desc: String,
    pub items: Vec<VoteItem>,
    pub join_num: i64,
    pub choice_cnt: i64,
    /// `max(join_num, sum of item counts)`.
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteItem {
    pub desc: String,
    pub cnt: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Share of `total`, rounded to a whole percent.
    pub percent: i64,
}

impl Vote {
    pub fn is_multiple_choice(&self) -> bool {
        self.choice_cnt > 1
    }
}

/// Normalizes one raw vote object.
pub fn normalize_vote(raw: &Value) -> Option<Vote> {
    if !raw.is_object() {
        return None;
    }

    let desc = first_str(raw, &["/desc", "/title"]).unwrap_or_default().to_string();
    let join_num = first_nonzero_i64(raw, &["/join_num", "/participant", "/total", "/total_num"]).unwrap_or(0);
    let choice_cnt = first_nonzero_i64(raw, &["/choice_cnt", "/choiceCount"]).unwrap_or_else(|| {
        if raw.get("multi_select").and_then(Value::as_bool).unwrap_or(false) { 2 } else { 1 }
    });

    let raw_items = first_present(raw, &["/items", "/options"])
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let counts: Vec<i64> = raw_items
        .iter()
        .map(|item| first_nonzero_i64(item, &["/cnt"]).unwrap_or(0))
        .collect();
    let total = join_num.max(counts.iter().sum());

    let items = raw_items
        .iter()
        .zip(counts)
        .map(|(item, cnt)| VoteItem {
            desc: first_str(item, &["/desc", "/name", "/text"]).unwrap_or_default().to_string(),
            cnt,
            image: first_str(item, &["/image"]).map(str::to_string),
            percent: if total > 0 { ((cnt as f64 / total as f64) * 100.0).round() as i64 } else { 0 },
        })
        .collect();

    Some(Vote { desc, items, join_num, choice_cnt, total })
}

/// Finds and normalizes the vote attached to a feed entry's `modules`.
pub fn vote_from_modules(modules: &Value) -> Option<Vote> {
    let interaction = first_present(modules, &["/module_interaction/vote", "/module_interaction/vote_info"]);
    let raw = interaction
        .map(|v| v.get("vote").filter(|inner| inner.is_object()).unwrap_or(v))
        .or_else(|| first_present(modules, &["/module_dynamic/major/vote", "/module_dynamic/additional/vote"]))?;
    normalize_vote(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_total_is_max_of_join_and_counts() {
        let vote = normalize_vote(&json!({
            "desc": "Best?",
            "join_num": 3,
            "items": [{"desc": "a", "cnt": 4}, {"desc": "b", "cnt": 1}]
        }))
        .unwrap();
        assert_eq!(vote.total, 5);
        assert_eq!(vote.items[0].percent, 80);
        assert_eq!(vote.choice_cnt, 1);
    }

    #[test]
    fn test_alternate_field_names() {
        let vote = normalize_vote(&json!({
            "title": "Pick",
            "participant": 10,
            "multi_select": true,
            "options": [{"name": "x", "image": "https://i0/x.png"}]
        }))
        .unwrap();
        assert_eq!(vote.desc, "Pick");
        assert_eq!(vote.join_num, 10);
        assert_eq!(vote.total, 10);
        assert!(vote.is_multiple_choice());
        assert_eq!(vote.items[0].desc, "x");
        assert_eq!(vote.items[0].image.as_deref(), Some("https://i0/x.png"));
        assert_eq!(vote.items[0].percent, 0);
    }

    #[test]
    fn test_zero_join_num_falls_through() {
        let vote = normalize_vote(&json!({"join_num": 0, "total_num": 7})).unwrap();
        assert_eq!(vote.join_num, 7);
    }

    #[test]
    fn test_lookup_order() {
        let modules = json!({
            "module_interaction": {"vote_info": {"vote": {"desc": "inner"}}},
            "module_dynamic": {"major": {"vote": {"desc": "major"}}}
        });
        assert_eq!(vote_from_modules(&modules).unwrap().desc, "inner");

        let modules = json!({"module_dynamic": {"additional": {"vote": {"desc": "additional", "choice_cnt": 3}}}});
        let vote = vote_from_modules(&modules).unwrap();
        assert_eq!(vote.desc, "additional");
        assert_eq!(vote.choice_cnt, 3);
    }

    #[test]
    fn test_no_vote() {
        assert_eq!(vote_from_modules(&json!({"module_dynamic": {}})), None);
        assert_eq!(normalize_vote(&json!(null)), None);
    }
}
