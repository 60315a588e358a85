pub mod account;
pub mod engagement;
pub mod notification;
pub mod post;
pub mod social_graph;
