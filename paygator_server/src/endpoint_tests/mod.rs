mod helpers;
mod mocks;

mod admin;
mod payments;
mod payouts;
