pub mod test_db;
pub mod signup;
pub mod signin;
pub mod save_route;
pub mod list_routes;

pub use test_db::test_db_handler;
pub use signup::signup_handler;
pub use signin::signin_handler;
pub use save_route::save_route_handler;
pub use list_routes::list_routes_handler;
