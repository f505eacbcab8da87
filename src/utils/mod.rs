pub mod checkin_cache;
