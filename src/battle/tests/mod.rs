pub mod common;



#[cfg(test)]
mod test_statuses;

#[cfg(test)]
mod test_field_effects;
