//! Dataplex resources and the client that reconciles them
//!
//! [`Client`] is generic over [`DataplexResource`]; the `*_lake`, `*_zone`
//! and `*_asset` methods below are typed shorthands for it.

pub mod apply;
pub mod asset;
pub mod client;
pub mod common;
pub mod lake;
pub mod resource;
pub mod zone;

pub use apply::{plan, ApiOperation};
pub use asset::{
    Asset, AssetDiscoveryStatus, AssetDiscoveryStatusStats, AssetResourceSpec,
    AssetResourceSpecReadAccessModeEnum, AssetResourceSpecTypeEnum, AssetResourceStatus,
    AssetSecurityStatus,
};
pub use client::{Client, ResourceList};
pub use common::{AssetStatus, CsvOptions, DiscoverySpec, JsonOptions};
pub use lake::{Lake, LakeMetastore, LakeMetastoreStatus, LakeStateEnum};
pub use resource::DataplexResource;
pub use zone::{Zone, ZoneResourceSpec, ZoneResourceSpecLocationTypeEnum, ZoneTypeEnum};

use crate::dcl::error::Result;
use crate::dcl::options::ApplyOption;

fn lake_parent(project: &str, location: &str) -> Lake {
    Lake {
        project: Some(project.to_string()),
        location: Some(location.to_string()),
        ..Default::default()
    }
}

fn zone_parent(project: &str, location: &str, lake: &str) -> Zone {
    Zone {
        project: Some(project.to_string()),
        location: Some(location.to_string()),
        lake: Some(lake.to_string()),
        ..Default::default()
    }
}

fn asset_parent(project: &str, location: &str, lake: &str, zone: &str) -> Asset {
    Asset {
        project: Some(project.to_string()),
        location: Some(location.to_string()),
        lake: Some(lake.to_string()),
        dataplex_zone: Some(zone.to_string()),
        ..Default::default()
    }
}

impl Client {
    pub async fn get_lake(&self, lake: &Lake) -> Result<Lake> {
        self.with_deadline("get Lake".to_string(), self.get(&lake.url_normalized()))
            .await
    }

    pub async fn apply_lake(&self, lake: &Lake, opts: &[ApplyOption<Lake>]) -> Result<Lake> {
        self.apply(lake, opts).await
    }

    pub async fn delete_lake(&self, lake: &Lake) -> Result<()> {
        self.delete(&lake.url_normalized()).await
    }

    /// Every lake in the location.
    pub async fn list_lake(&self, project: &str, location: &str) -> Result<Vec<Lake>> {
        self.list_all(&lake_parent(project, location)).await
    }

    pub async fn list_lake_page(
        &self,
        project: &str,
        location: &str,
        page_size: Option<i32>,
    ) -> Result<ResourceList<Lake>> {
        self.list_page(&lake_parent(project, location), None, page_size)
            .await
    }

    /// Deletes every lake in the location for which `filter` returns true.
    pub async fn delete_all_lake<F>(&self, project: &str, location: &str, filter: F) -> Result<()>
    where
        F: Fn(&Lake) -> bool,
    {
        self.delete_all(&lake_parent(project, location), filter).await
    }

    pub async fn get_zone(&self, zone: &Zone) -> Result<Zone> {
        self.with_deadline("get Zone".to_string(), self.get(&zone.url_normalized()))
            .await
    }

    pub async fn apply_zone(&self, zone: &Zone, opts: &[ApplyOption<Zone>]) -> Result<Zone> {
        self.apply(zone, opts).await
    }

    pub async fn delete_zone(&self, zone: &Zone) -> Result<()> {
        self.delete(&zone.url_normalized()).await
    }

    pub async fn list_zone(&self, project: &str, location: &str, lake: &str) -> Result<Vec<Zone>> {
        self.list_all(&zone_parent(project, location, lake)).await
    }

    pub async fn list_zone_page(
        &self,
        project: &str,
        location: &str,
        lake: &str,
        page_size: Option<i32>,
    ) -> Result<ResourceList<Zone>> {
        self.list_page(&zone_parent(project, location, lake), None, page_size)
            .await
    }

    pub async fn delete_all_zone<F>(
        &self,
        project: &str,
        location: &str,
        lake: &str,
        filter: F,
    ) -> Result<()>
    where
        F: Fn(&Zone) -> bool,
    {
        self.delete_all(&zone_parent(project, location, lake), filter)
            .await
    }

    pub async fn get_asset(&self, asset: &Asset) -> Result<Asset> {
        self.with_deadline("get Asset".to_string(), self.get(&asset.url_normalized()))
            .await
    }

    pub async fn apply_asset(&self, asset: &Asset, opts: &[ApplyOption<Asset>]) -> Result<Asset> {
        self.apply(asset, opts).await
    }

    pub async fn delete_asset(&self, asset: &Asset) -> Result<()> {
        self.delete(&asset.url_normalized()).await
    }

    pub async fn list_asset(
        &self,
        project: &str,
        location: &str,
        lake: &str,
        zone: &str,
    ) -> Result<Vec<Asset>> {
        self.list_all(&asset_parent(project, location, lake, zone))
            .await
    }

    pub async fn list_asset_page(
        &self,
        project: &str,
        location: &str,
        lake: &str,
        zone: &str,
        page_size: Option<i32>,
    ) -> Result<ResourceList<Asset>> {
        self.list_page(&asset_parent(project, location, lake, zone), None, page_size)
            .await
    }

    pub async fn delete_all_asset<F>(
        &self,
        project: &str,
        location: &str,
        lake: &str,
        zone: &str,
        filter: F,
    ) -> Result<()>
    where
        F: Fn(&Asset) -> bool,
    {
        self.delete_all(&asset_parent(project, location, lake, zone), filter)
            .await
    }
}
