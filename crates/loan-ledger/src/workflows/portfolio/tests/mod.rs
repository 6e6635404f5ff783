mod common;
mod evaluation;
mod forecast;
