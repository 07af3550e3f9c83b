pub mod allocation;
pub mod completed_tour;
pub mod errors;
pub mod insertion;
pub mod objectives;
pub mod optimiser;
pub mod optimiser_params;
pub mod stop;
pub mod tour;
