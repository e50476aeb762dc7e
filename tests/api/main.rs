mod helpers;
mod newsletters;
mod postgres_store;
mod promotions;
