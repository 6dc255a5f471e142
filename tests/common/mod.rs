/// Runs a Slate program through a [`Session`](slate_lang::Session) against a
/// captured sink.
///
/// `is OK` asserts a clean run whose stdout is the expected lines;
/// `is ERR` asserts a compile-time (scan/parse/resolve) error;
/// `is FAULT` asserts a runtime error, with stdout up to the fault still
/// compared against the expected lines.
#[macro_export]
macro_rules! tests {
    ($name:ident is OK $source:literal $(=> $($expected:literal)+)?) => {
        #[test]
        fn $name() {
            use slate_lang::Session;

            let mut expected: Vec<&str> = vec![$($($expected),+)?];
            let expected = match expected.len() {
                0 => String::new(),
                _ => {
                    // A trailing empty entry adds the final newline.
                    expected.push("");
                    expected.join("\n")
                }
            };

            let mut output = Vec::new();
            let mut session = Session::new(&mut output);
            session.run($source);

            assert!(!session.had_error(), "unexpected compile error");
            assert!(!session.had_runtime_error(), "unexpected runtime error");

            drop(session);
            assert_eq!(expected, std::str::from_utf8(&output).unwrap());
        }
    };

    ($name:ident is ERR $source:literal) => {
        #[test]
        fn $name() {
            use slate_lang::Session;

            let mut output = Vec::new();
            let mut session = Session::new(&mut output);
            session.run($source);

            assert!(session.had_error(), "expected a compile error");
            assert!(!session.had_runtime_error(), "expected execution not to start");

            drop(session);
            assert_eq!("", std::str::from_utf8(&output).unwrap());
        }
    };

    ($name:ident is FAULT $source:literal $(=> $($expected:literal)+)?) => {
        #[test]
        fn $name() {
            use slate_lang::Session;

            let mut expected: Vec<&str> = vec![$($($expected),+)?];
            let expected = match expected.len() {
                0 => String::new(),
                _ => {
                    expected.push("");
                    expected.join("\n")
                }
            };

            let mut output = Vec::new();
            let mut session = Session::new(&mut output);
            session.run($source);

            assert!(!session.had_error(), "unexpected compile error");
            assert!(session.had_runtime_error(), "expected a runtime error");

            drop(session);
            assert_eq!(expected, std::str::from_utf8(&output).unwrap());
        }
    };
}
