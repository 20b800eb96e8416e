mod campaign;
mod heuristics;
mod helpers;
mod session;
