//! Response statistics and listings.
//!
//! Consumer-facing aggregates over the response/answer data: per-activity
//! counts and averages, and a paginated response listing whose answers are
//! shaped uniformly whether they come from the relational rows or from the
//! legacy JSON column.

use std::collections::{HashMap, HashSet};

use canvass_common::AppResult;
use canvass_db::entities::{answer, response};
use canvass_db::repositories::{
    ActivityRepository, AnswerRepository, ParticipantRepository, ResponseFilter,
    ResponseRepository,
};
use serde_json::Value as JsonValue;

const DEFAULT_PER_PAGE: u64 = 15;
const MAX_PER_PAGE: u64 = 100;

/// Statistics service for reporting consumers.
#[derive(Clone)]
pub struct StatisticsService {
    activity_repo: ActivityRepository,
    participant_repo: ParticipantRepository,
    response_repo: ResponseRepository,
    answer_repo: AnswerRepository,
}

/// Aggregate counts for one activity's responses.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityStatistics {
    pub total_responses: u64,
    pub submitted: u64,
    pub in_progress: u64,
    pub anonymous_responses: u64,
    pub registered_responses: u64,
    /// Mean completion percentage, two decimals
    pub average_completion: f64,
    /// Mean seconds spent per answer, two decimals
    pub average_time_per_answer: f64,
}

/// Query parameters for the response listing.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub status: Option<String>,
    pub participant_id: Option<String>,
    pub page: u64,
    pub per_page: Option<u64>,
}

/// One page of an activity's responses.
#[derive(Debug, Clone)]
pub struct ResponseListing {
    pub items: Vec<ResponseListItem>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// A listed response with uniformly shaped answers.
#[derive(Debug, Clone)]
pub struct ResponseListItem {
    pub response: response::Model,
    pub answers: Vec<AnswerView>,
}

/// The uniform answer shape consumers expect, independent of whether the
/// answer came from a relational row or the legacy JSON column.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerView {
    pub question_id: String,
    pub value: Option<JsonValue>,
    pub value_array: Option<JsonValue>,
}

impl StatisticsService {
    /// Create a new statistics service.
    #[must_use]
    pub const fn new(
        activity_repo: ActivityRepository,
        participant_repo: ParticipantRepository,
        response_repo: ResponseRepository,
        answer_repo: AnswerRepository,
    ) -> Self {
        Self {
            activity_repo,
            participant_repo,
            response_repo,
            answer_repo,
        }
    }

    /// Aggregate counts for an activity, scoped to non-preview responses
    /// from valid participants plus guest responses.
    pub async fn statistics(&self, activity_id: &str) -> AppResult<ActivityStatistics> {
        self.activity_repo.get_by_id(activity_id).await?;

        let valid_ids = self.participant_repo.valid_ids(activity_id).await?;
        let responses = self.response_repo.find_scoped(activity_id, &valid_ids).await?;

        let anonymous_ids: HashSet<String> = self
            .participant_repo
            .anonymous_ids(activity_id)
            .await?
            .into_iter()
            .collect();

        let total = responses.len() as u64;
        let submitted = responses.iter().filter(|r| r.is_submitted()).count() as u64;
        let in_progress = responses.iter().filter(|r| r.is_in_progress()).count() as u64;

        // Anonymous bucket: guest responses with no participant, plus
        // registered participants explicitly flagged anonymous
        let anonymous_responses = responses
            .iter()
            .filter(|r| match r.participant_id.as_ref() {
                None => true,
                Some(participant_id) => anonymous_ids.contains(participant_id),
            })
            .count() as u64;

        let average_completion = if responses.is_empty() {
            0.0
        } else {
            round2(
                responses.iter().map(|r| r.completion_percentage).sum::<f64>()
                    / responses.len() as f64,
            )
        };

        let response_ids: Vec<String> = responses.iter().map(|r| r.id.clone()).collect();
        let answers = self.answer_repo.find_for_responses(&response_ids).await?;
        let times: Vec<i32> = answers.iter().filter_map(|a| a.time_spent).collect();
        let average_time_per_answer = if times.is_empty() {
            0.0
        } else {
            round2(f64::from(times.iter().sum::<i32>()) / times.len() as f64)
        };

        Ok(ActivityStatistics {
            total_responses: total,
            submitted,
            in_progress,
            anonymous_responses,
            registered_responses: total - anonymous_responses,
            average_completion,
            average_time_per_answer,
        })
    }

    /// List an activity's responses (paginated, newest first). Answers come
    /// from the relational rows; responses written before the relational
    /// model existed fall back to parsing the legacy JSON column.
    pub async fn index(&self, activity_id: &str, query: ListQuery) -> AppResult<ResponseListing> {
        self.activity_repo.get_by_id(activity_id).await?;

        let valid_ids = self.participant_repo.valid_ids(activity_id).await?;
        let filter = ResponseFilter {
            status: query.status,
            participant_id: query.participant_id,
        };

        let page = query.page.max(1);
        let per_page = query
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let offset = (page - 1) * per_page;

        let total = self
            .response_repo
            .count_for_activity(activity_id, &valid_ids, &filter)
            .await?;
        let responses = self
            .response_repo
            .list_for_activity(activity_id, &valid_ids, &filter, per_page, offset)
            .await?;

        let response_ids: Vec<String> = responses.iter().map(|r| r.id.clone()).collect();
        let mut answers_by_response: HashMap<String, Vec<answer::Model>> = HashMap::new();
        for answer in self.answer_repo.find_for_responses(&response_ids).await? {
            answers_by_response
                .entry(answer.response_id.clone())
                .or_default()
                .push(answer);
        }

        let items = responses
            .into_iter()
            .map(|response| {
                let relational = answers_by_response.remove(&response.id).unwrap_or_default();
                let answers = if relational.is_empty() {
                    shape_legacy_answers(response.answers.as_ref())
                } else {
                    relational.iter().map(shape_answer).collect()
                };
                ResponseListItem { response, answers }
            })
            .collect();

        Ok(ResponseListing {
            items,
            total,
            page,
            per_page,
        })
    }
}

fn shape_answer(answer: &answer::Model) -> AnswerView {
    AnswerView {
        question_id: answer.question_id.clone(),
        value: answer.value.clone().map(JsonValue::String),
        value_array: answer.value_array.clone(),
    }
}

/// Parse the legacy JSON column `{question_id: value_or_array}` into the
/// uniform listing shape. Arrays land in `value_array`, scalars in `value`.
#[must_use]
pub fn shape_legacy_answers(json: Option<&JsonValue>) -> Vec<AnswerView> {
    let Some(JsonValue::Object(map)) = json else {
        return Vec::new();
    };

    map.iter()
        .map(|(question_id, value)| match value {
            JsonValue::Array(_) => AnswerView {
                question_id: question_id.clone(),
                value: None,
                value_array: Some(value.clone()),
            },
            other => AnswerView {
                question_id: question_id.clone(),
                value: Some(other.clone()),
                value_array: None,
            },
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shape_legacy_answers_splits_arrays_and_scalars() {
        let legacy = json!({
            "q1": "Doctor",
            "q2": ["a", "b"],
            "q3": 7,
        });

        let mut shaped = shape_legacy_answers(Some(&legacy));
        shaped.sort_by(|a, b| a.question_id.cmp(&b.question_id));

        assert_eq!(shaped.len(), 3);
        assert_eq!(shaped[0].value, Some(json!("Doctor")));
        assert_eq!(shaped[0].value_array, None);
        assert_eq!(shaped[1].value, None);
        assert_eq!(shaped[1].value_array, Some(json!(["a", "b"])));
        assert_eq!(shaped[2].value, Some(json!(7)));
    }

    #[test]
    fn test_shape_legacy_answers_tolerates_missing_or_malformed() {
        assert!(shape_legacy_answers(None).is_empty());
        assert!(shape_legacy_answers(Some(&json!("not a map"))).is_empty());
        assert!(shape_legacy_answers(Some(&json!(null))).is_empty());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(33.333_333), 33.33);
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(0.0), 0.0);
    }
}
