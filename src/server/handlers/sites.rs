//! Site endpoints (`/api/sites`)

use crate::codec::{SitePayload, SiteView};
use crate::database::{InventoryDatabase, NewSite, SiteRecord, SITE_FILTERS};
use crate::filters::{FilterSpec, ListArgs};
use crate::server::handler::Resource;
use anyhow::Result;

pub struct SiteResource;

impl Resource for SiteResource {
    const NAME: &'static str = "site";
    const PLURAL: &'static str = "sites";
    const FILTERS: FilterSpec = SITE_FILTERS;

    type Payload = SitePayload;
    type New = NewSite;
    type Record = SiteRecord;
    type View = SiteView;

    fn list(db: &InventoryDatabase, args: &ListArgs) -> Result<Vec<SiteRecord>> {
        db.sites().list(args)
    }

    fn count(db: &InventoryDatabase, args: &ListArgs) -> Result<u64> {
        db.sites().count(args)
    }

    fn get(db: &InventoryDatabase, id: i64) -> Result<Option<SiteRecord>> {
        db.sites().get(id)
    }

    fn insert(db: &InventoryDatabase, new: &NewSite) -> Result<i64> {
        db.sites().insert(new)
    }

    fn update(db: &InventoryDatabase, id: i64, new: &NewSite) -> Result<bool> {
        db.sites().update(id, new)
    }

    fn delete(db: &InventoryDatabase, id: i64) -> Result<bool> {
        db.sites().delete(id)
    }
}
