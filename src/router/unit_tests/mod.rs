#[cfg(test)]
mod route_tests;
