///! Small helpers shared by the engine and the BT node library.

/// Get the full path to a function from crate downwards
macro_rules! get_function_path {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        name.strip_suffix("::f").unwrap()
    }};
}
pub(crate) use get_function_path;

// Returns the function name along with its direct owner.
macro_rules! get_function_name {
    () => {{
        let path: &'static str = crate::utils::get_function_path!();
        let split_res = path.split_terminator("::").collect::<Vec<&str>>();
        match split_res.len().checked_sub(2) {
            None => path.to_string(),
            Some(second_last_index) => split_res.split_at(second_last_index).1.join("::"),
        }
    }
    .to_string()};
}
pub(crate) use get_function_name;

#[cfg(test)]
mod tests {
    #[test]
    fn test_function_macros() {
        let path = get_function_path!();
        let name = get_function_name!();
        assert_eq!(path, "hsm_bt::utils::tests::test_function_macros");
        assert_eq!(name, "tests::test_function_macros");
    }
}
