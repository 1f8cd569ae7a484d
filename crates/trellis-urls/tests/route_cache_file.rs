// Writing the route table to disk and reading it back

use hyper::Method;
use tempfile::TempDir;
use trellis_exception::Error;
use trellis_urls::routers::{GroupAttributes, ResourceOptions, Router};

fn application_routes() -> Router {
	let mut router = Router::new();
	router
		.group(
			GroupAttributes::new()
				.prefix("/api")
				.middleware("throttle")
				.namespace("Api")
				.name("api."),
			|r| {
				r.api_resource("photos", "PhotoController", ResourceOptions::new())?;
				r.get("/me", "ProfileController@show")?
					.name("me")?
					.scheme("https")?;
				Ok(())
			},
		)
		.unwrap();
	router
		.get("/", "HomeController")
		.unwrap()
		.domain("{tenant}.example.com")
		.unwrap()
		.defaults("tenant", "www");
	router
}

#[test]
fn test_cache_file_round_trip() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("routes.json");

	let router = application_routes();
	router.save_cache(&path).unwrap();

	let mut loaded = Router::new();
	loaded.load_cache(&path).unwrap();

	assert_eq!(loaded.describe(), router.describe());
	assert_eq!(
		loaded.url("api.photos.show", &[("id", "9")]).unwrap(),
		"/api/photos/9"
	);

	let me = loaded.route_by_name("api.me").unwrap();
	assert_eq!(me.scheme(), Some("https"));
	assert_eq!(me.handler().to_string(), "Api::ProfileController@show");

	let home = loaded
		.resolve(&Method::GET, "/", Some("acme.example.com"), "http")
		.unwrap();
	assert_eq!(home.params.get("tenant").map(String::as_str), Some("acme"));
}

#[test]
fn test_cache_file_is_plain_json() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("routes.json");
	application_routes().save_cache(&path).unwrap();

	let json: serde_json::Value =
		serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
	assert_eq!(json["version"], 1);
	assert_eq!(json["routes"][0]["method"], "GET");
	assert_eq!(json["routes"][0]["path"], "/api/photos");
	assert_eq!(json["routes"][0]["handler"]["kind"], "action");
	assert_eq!(json["routes"][0]["middleware"][0], "throttle");
}

#[test]
fn test_missing_cache_file() {
	let dir = TempDir::new().unwrap();
	let mut router = Router::new();
	let err = router.load_cache(dir.path().join("absent.json")).unwrap_err();
	assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_corrupt_cache_file() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("routes.json");
	std::fs::write(&path, "{ not json").unwrap();

	let mut router = Router::new();
	assert!(matches!(
		router.load_cache(&path),
		Err(Error::Serialization(_))
	));
}
