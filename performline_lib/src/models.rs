//! Resource types of the PerformLine API.
//!
//! Each marker type in [`kind`] describes one endpoint; the aliases below are
//! the records callers work with.

use performline_api::Record;

pub mod kind {
    use performline_api::{Method, Resource};

    pub struct Brand;

    impl Resource for Brand {
        const NAME: &'static str = "Brand";
        const REST_ROOT: &'static str = "/common/brands/";
        const FIELDS: &'static [&'static str] = &["id", "name", "created_at", "last_scored_at"];
    }

    /// A rule as applied to one brand.
    pub struct BrandRule;

    impl Resource for BrandRule {
        const NAME: &'static str = "BrandRule";
        const REST_ROOT: &'static str = "/common/brands/{brand_id}/rules/";
        const CREATE_METHOD: Option<Method> = None;
        const UPDATE_METHOD: Option<Method> = None;
    }

    pub struct Campaign;

    impl Resource for Campaign {
        const NAME: &'static str = "Campaign";
        const REST_ROOT: &'static str = "/common/campaigns/";
        const FIELDS: &'static [&'static str] = &["id", "name", "brand_id", "created_at"];
    }

    /// A rule as applied to one campaign.
    pub struct CampaignRule;

    impl Resource for CampaignRule {
        const NAME: &'static str = "CampaignRule";
        const REST_ROOT: &'static str = "/common/campaigns/{campaign_id}/rules/";
        const CREATE_METHOD: Option<Method> = None;
        const UPDATE_METHOD: Option<Method> = None;
    }

    pub struct Rule;

    impl Resource for Rule {
        const NAME: &'static str = "Rule";
        const REST_ROOT: &'static str = "/common/rules/";
        const FIELDS: &'static [&'static str] = &["id", "name", "description"];
    }

    pub struct TrafficSource;

    impl Resource for TrafficSource {
        const NAME: &'static str = "TrafficSource";
        const REST_ROOT: &'static str = "/common/trafficsources/";
        const FIELDS: &'static [&'static str] = &["id", "name"];
    }

    /// Scorable content of any product.
    pub struct Item;

    impl Resource for Item {
        const NAME: &'static str = "Item";
        const REST_ROOT: &'static str = "/common/items/";
        const CREATE_METHOD: Option<Method> = None;
        const UPDATE_METHOD: Option<Method> = None;
    }

    pub struct WebPage;

    impl Resource for WebPage {
        const NAME: &'static str = "WebPage";
        const REST_ROOT: &'static str = "/web/pages/";
        const CREATE_METHOD: Option<Method> = None;
        const UPDATE_METHOD: Option<Method> = None;
    }

    pub struct Call;

    impl Resource for Call {
        const NAME: &'static str = "Call";
        const REST_ROOT: &'static str = "/callcenter/calls/";
        const CREATE_METHOD: Option<Method> = None;
        const UPDATE_METHOD: Option<Method> = None;
    }

    pub struct Chat;

    impl Resource for Chat {
        const NAME: &'static str = "Chat";
        const REST_ROOT: &'static str = "/chatscout/chats/";
        const CREATE_METHOD: Option<Method> = None;
        const UPDATE_METHOD: Option<Method> = None;
    }
}

pub type Brand = Record<kind::Brand>;
pub type BrandRule = Record<kind::BrandRule>;
pub type Campaign = Record<kind::Campaign>;
pub type CampaignRule = Record<kind::CampaignRule>;
pub type Rule = Record<kind::Rule>;
pub type TrafficSource = Record<kind::TrafficSource>;
pub type Item = Record<kind::Item>;
pub type WebPage = Record<kind::WebPage>;
pub type Call = Record<kind::Call>;
pub type Chat = Record<kind::Chat>;

/// Path used to list remediation statuses.
pub const REMEDIATION_STATUS_PATH: &str = "/common/remediation_status/";

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_paths() {
        assert_eq!(Brand::with_key(42).formatted_path().unwrap(), "/common/brands/42/");
        assert_eq!(Call::with_key(5).formatted_path().unwrap(), "/callcenter/calls/5/");
        assert_eq!(WebPage::with_key(8).formatted_path().unwrap(), "/web/pages/8/");
        assert_eq!(Chat::with_key(1).formatted_path().unwrap(), "/chatscout/chats/1/");
        assert_eq!(
            TrafficSource::with_key(3).formatted_path().unwrap(),
            "/common/trafficsources/3/"
        );
    }

    #[test]
    fn nested_rule_paths() {
        let rule = CampaignRule::new(json!({"id": 11, "campaign_id": 4}));
        assert_eq!(rule.formatted_path().unwrap(), "/common/campaigns/4/rules/11/");

        let rule = BrandRule::with_key(11);
        assert!(rule.formatted_path().is_err());
    }

    #[test]
    fn declared_fields_are_writable() {
        let mut campaign = Campaign::default();
        assert!(campaign.set_field("brand_id", 9));
        assert_eq!(campaign.field_i64("BrandId"), Some(9));

        let mut item = Item::default();
        assert!(!item.set_field("brand_id", 9));
    }
}
