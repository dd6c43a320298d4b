//! Station listing handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::domain::{ChargePoint, ChargingProfile, Connector, ProfileFilter, Transaction};
use crate::interfaces::http::common::{api_error, ApiResponse, ApiResult};
use crate::interfaces::http::ApiState;

#[derive(Debug, Serialize)]
pub struct StationDto {
    #[serde(flatten)]
    pub charge_point: ChargePoint,
    pub is_connected: bool,
    pub connectors: Vec<Connector>,
}

pub async fn list_stations(State(state): State<ApiState>) -> ApiResult<Vec<StationDto>> {
    let charge_points = state
        .services
        .charge_points
        .list_charge_points()
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let mut stations = Vec::with_capacity(charge_points.len());
    for charge_point in charge_points {
        let connectors = state
            .services
            .charge_points
            .connectors(&charge_point.id)
            .await
            .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        stations.push(StationDto {
            is_connected: state.registry.is_connected(&charge_point.id),
            charge_point,
            connectors,
        });
    }
    Ok(Json(ApiResponse::success(stations)))
}

pub async fn list_station_transactions(
    State(state): State<ApiState>,
    Path(charge_point_id): Path<String>,
) -> ApiResult<Vec<Transaction>> {
    match state
        .services
        .transactions
        .transactions_for_station(&charge_point_id)
        .await
    {
        Ok(transactions) => Ok(Json(ApiResponse::success(transactions))),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

pub async fn list_charging_profiles(
    State(state): State<ApiState>,
    Path(charge_point_id): Path<String>,
) -> ApiResult<Vec<ChargingProfile>> {
    match state
        .services
        .smart_charging
        .profiles(&charge_point_id, &ProfileFilter::default())
        .await
    {
        Ok(profiles) => Ok(Json(ApiResponse::success(profiles))),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
