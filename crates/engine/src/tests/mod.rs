mod helpers;
mod map_tests;
