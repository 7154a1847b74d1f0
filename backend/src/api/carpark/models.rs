//! API shapes for carpark resources.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::database::models::Carpark;
use crate::services::carpark_service::NewCarpark;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CarparkDto {
    pub id: String,
    pub carpark_id: String,
    pub carpark_name: String,
    pub lot_type: String,
    pub area: String,
    pub agency_type: String,
    pub address: String,
    pub x_coord: String,
    pub y_coord: String,
}

impl From<Carpark> for CarparkDto {
    fn from(carpark: Carpark) -> Self {
        Self {
            id: carpark.id,
            carpark_id: carpark.carpark_id,
            carpark_name: carpark.carpark_name,
            lot_type: carpark.lot_type,
            area: carpark.area,
            agency_type: carpark.agency_type,
            address: carpark.address,
            x_coord: carpark.x_coord,
            y_coord: carpark.y_coord,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCarparkRequest {
    #[validate(length(min = 1, max = 32, message = "Carpark ID must be between 1-32 characters"))]
    pub carpark_id: String,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Carpark name must be between 1-255 characters"
    ))]
    pub carpark_name: String,

    #[serde(default)]
    pub lot_type: String,

    #[serde(default)]
    pub area: String,

    #[serde(default)]
    pub agency_type: String,

    #[serde(default)]
    #[validate(length(max = 255, message = "Address too long"))]
    pub address: String,

    #[serde(default)]
    pub x_coord: String,

    #[serde(default)]
    pub y_coord: String,
}

impl From<CreateCarparkRequest> for NewCarpark {
    fn from(request: CreateCarparkRequest) -> Self {
        Self {
            carpark_id: request.carpark_id.trim().to_string(),
            carpark_name: request.carpark_name.trim().to_string(),
            lot_type: request.lot_type,
            area: request.area,
            agency_type: request.agency_type,
            address: request.address,
            x_coord: request.x_coord,
            y_coord: request.y_coord,
        }
    }
}
