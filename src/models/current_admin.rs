use serde::{Deserialize, Serialize};

/// Administrator signed into the panel, as shown in the navigation bar.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub email: String,
}
