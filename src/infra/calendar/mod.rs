pub mod disabled_calendar_gateway;
pub mod http_calendar_gateway;
