use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: i64,

    #[serde(default)]
    pub code: String,

    pub name: String,

    #[serde(default)]
    pub location: String,
}
