pub mod home_route;
pub mod search_request;
pub mod search_response;
pub mod search_route;
