//! UK Parliament Members API adapter.
//!
//! Endpoints used:
//! - `GET /Members/Search?Name=..&House=1&IsCurrentMember=true`
//! - `GET /Members/{id}/Biography`
//! - `GET /Members/{id}/Synopsis`

use serde::Deserialize;

use mpbio_utils::{html_to_text, HttpClient};

use super::{parse_api_date, PositionKind, PositionRecord, PositionSource, RosterSource};
use crate::config::RosterConfig;
use crate::errors::SourceError;
use crate::types::{Chamber, EntityCandidate, PRIMARY_CHAMBER};

/// Roster, positions and synopsis from the Members API.
#[derive(Debug, Clone)]
pub struct MembersApi {
    http: HttpClient,
    config: RosterConfig,
}

impl MembersApi {
    pub fn new(http: HttpClient, config: RosterConfig) -> Self {
        Self { http, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    value: Option<MemberValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemberValue {
    id: Option<u32>,
    name_display_as: Option<String>,
    latest_party: Option<PartyValue>,
    latest_house_membership: Option<HouseMembership>,
}

#[derive(Debug, Deserialize)]
struct PartyValue {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HouseMembership {
    membership_from: Option<String>,
    house: Option<u8>,
    membership_end_date: Option<String>,
    membership_status: Option<MembershipStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MembershipStatus {
    status_is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct BiographyResponse {
    value: Option<BiographyValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BiographyValue {
    #[serde(default)]
    government_posts: Vec<PostValue>,
    #[serde(default)]
    opposition_posts: Vec<PostValue>,
    #[serde(default)]
    other_posts: Vec<PostValue>,
    #[serde(default)]
    committee_memberships: Vec<PostValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostValue {
    name: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SynopsisResponse {
    value: Option<String>,
}

// ============================================================================
// Conversions
// ============================================================================

fn to_candidate(value: MemberValue) -> Option<EntityCandidate> {
    let id = value.id?;
    let display_name = value.name_display_as?.trim().to_string();
    if display_name.is_empty() {
        return None;
    }

    let membership = value.latest_house_membership?;
    let chamber = membership.house.and_then(Chamber::from_house_id)?;
    let active = membership
        .membership_status
        .and_then(|s| s.status_is_active)
        .unwrap_or(false);

    Some(EntityCandidate {
        id,
        display_name,
        party: value.latest_party.and_then(|p| p.name),
        constituency: membership.membership_from,
        chamber,
        current: active && membership.membership_end_date.is_none(),
    })
}

fn to_positions(value: BiographyValue) -> Vec<PositionRecord> {
    let groups = [
        (PositionKind::GovernmentPost, value.government_posts),
        (PositionKind::OppositionPost, value.opposition_posts),
        (PositionKind::OtherPost, value.other_posts),
        (PositionKind::Committee, value.committee_memberships),
    ];

    groups
        .into_iter()
        .flat_map(|(kind, posts)| {
            posts.into_iter().filter_map(move |post| {
                let name = post.name?.trim().to_string();
                if name.is_empty() {
                    return None;
                }
                Some(PositionRecord {
                    name,
                    kind,
                    start_date: post.start_date.as_deref().and_then(parse_api_date),
                    end_date: post.end_date.as_deref().and_then(parse_api_date),
                })
            })
        })
        .collect()
}

// ============================================================================
// Trait implementations
// ============================================================================

impl RosterSource for MembersApi {
    fn search_members(&self, name: &str, limit: usize) -> Result<Vec<EntityCandidate>, SourceError> {
        let response: SearchResponse = self.http.get_json(
            &self.url("/Members/Search"),
            &[
                ("Name", name.to_string()),
                ("House", PRIMARY_CHAMBER.house_id().to_string()),
                ("IsCurrentMember", "true".to_string()),
                ("skip", "0".to_string()),
                ("take", limit.to_string()),
            ],
        )?;

        let candidates: Vec<EntityCandidate> = response
            .items
            .into_iter()
            .filter_map(|item| item.value)
            .filter_map(to_candidate)
            .collect();
        tracing::debug!(query = name, count = candidates.len(), "Roster search returned");
        Ok(candidates)
    }
}

impl PositionSource for MembersApi {
    fn fetch_positions(&self, member_id: u32) -> Result<Vec<PositionRecord>, SourceError> {
        let response: BiographyResponse = self
            .http
            .get_json(&self.url(&format!("/Members/{}/Biography", member_id)), &[])?;
        let value = response
            .value
            .ok_or_else(|| SourceError::Malformed("biography without value".to_string()))?;
        Ok(to_positions(value))
    }

    fn fetch_synopsis(&self, member_id: u32) -> Result<Option<String>, SourceError> {
        let response: SynopsisResponse = self
            .http
            .get_json(&self.url(&format!("/Members/{}/Synopsis", member_id)), &[])?;

        match response.value.filter(|v| !v.trim().is_empty()) {
            Some(html) => Ok(Some(html_to_text(&html)?)),
            None => Ok(None),
        }
    }

    fn profile_url(&self, member_id: u32) -> Option<String> {
        Some(self.config.profile_url.replace("{id}", &member_id.to_string()))
    }
}
