//! Route table and pattern matching.

mod handler;
mod match_cache;
mod pattern;
mod resource;
mod reverse;
mod route;
mod route_cache;
mod route_group;
mod router;

pub use handler::{
	Action, ActionSet, Argument, Arguments, Controller, ControllerRegistry, HandlerDecorator,
	HandlerDescriptor, HandlerRef, HandlerReturn, ParamDescriptor, TypeTag, as_controller,
	controller_service,
};
pub use match_cache::{DEFAULT_MATCH_CACHE_CAPACITY, MatchCache, MatchKey};
pub use pattern::{
	DEFAULT_HOST_SEGMENT, DEFAULT_OPTIONAL_SEGMENT, DEFAULT_SEGMENT, DomainPattern, ParamSpec,
	PathPattern, library_pattern,
};
pub use resource::{RESOURCE_ACTIONS, ResourceOptions};
pub use route::{Route, join_paths, normalize_path};
pub use route_cache::{CachedRoute, ROUTE_CACHE_VERSION, RouteCacheFile};
pub use route_group::{GroupAttributes, IntoMiddlewareNames};
pub use router::{RouteHandle, RouteId, RouteMatch, RouteSummary, Router, RouterMacro, VERBS};
