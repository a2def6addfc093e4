//! Registry-based route construction
//!
//! `ResourceRouter` mounts the generic handlers for each registered
//! [`Resource`] under `/api/<PLURAL>`:
//!
//! | Method | Path                    | Handler     |
//! |--------|-------------------------|-------------|
//! | GET    | `/api/<plural>`         | list        |
//! | POST   | `/api/<plural>`         | create      |
//! | GET    | `/api/<plural>/count`   | count       |
//! | GET    | `/api/<plural>/:id`     | get_one     |
//! | PUT    | `/api/<plural>/:id`     | update      |
//! | DELETE | `/api/<plural>/:id`     | delete      |

use crate::server::handler::{self, Resource};
use crate::server::ApiState;
use axum::routing::get;
use axum::Router as AxumRouter;
use std::collections::BTreeMap;

pub struct ResourceRouter {
    routes: AxumRouter<ApiState>,

    /// Path segment to singular name
    resources: BTreeMap<&'static str, &'static str>,
}

impl ResourceRouter {
    pub fn new() -> Self {
        Self {
            routes: AxumRouter::new(),
            resources: BTreeMap::new(),
        }
    }

    /// Mount the six endpoints of a resource
    pub fn register<R: Resource>(&mut self) -> &mut Self {
        let base = format!("/api/{}", R::PLURAL);
        let routes = std::mem::replace(&mut self.routes, AxumRouter::new())
            .route(&base, get(handler::list::<R>).post(handler::create::<R>))
            .route(&format!("{}/count", base), get(handler::count::<R>))
            .route(
                &format!("{}/:id", base),
                get(handler::get_one::<R>)
                    .put(handler::update::<R>)
                    .delete(handler::delete::<R>),
            );
        self.routes = routes;
        self.resources.insert(R::PLURAL, R::NAME);
        self
    }

    pub fn has_resource(&self, plural: &str) -> bool {
        self.resources.contains_key(plural)
    }

    /// Registered path segments, sorted
    pub fn resource_names(&self) -> Vec<&'static str> {
        self.resources.keys().copied().collect()
    }

    pub fn into_routes(self) -> AxumRouter<ApiState> {
        self.routes
    }
}

impl Default for ResourceRouter {
    fn default() -> Self {
        Self::new()
    }
}
