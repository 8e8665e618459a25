use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::subscription_models::SubscriptionKeys;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    /// Owner of the subscription; omit for anonymous browsers.
    pub user_id: Option<Uuid>,
    #[validate(length(min = 1, max = 2048))]
    pub endpoint: String,
    #[validate(nested)]
    pub keys: SubscriptionKeysRequest,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubscriptionKeysRequest {
    #[validate(length(min = 1))]
    pub p256dh: String,
    #[validate(length(min = 1))]
    pub auth: String,
}

impl From<SubscriptionKeysRequest> for SubscriptionKeys {
    fn from(keys: SubscriptionKeysRequest) -> Self {
        Self {
            p256dh: keys.p256dh,
            auth: keys.auth,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResponse {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub endpoint: String,
}
