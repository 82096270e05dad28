pub mod mobile_money;
