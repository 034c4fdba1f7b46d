#[cfg(test)]
mod tests {
    use crate::config::GeneratorConfig;
    use crate::utils::{generate_bindings_file, generate_module, GenerateError, LibraryJob};
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const PYCINTERFACE: &str = r#"
/**
 * Example library with interface to Python
 */
#include "OsDetection.h"
#include "ImageTypes.h"

template <typename T>
void clean_memory(Imterface<T> *im_in)
{
    delete[] im_in->data;
}

DLL_EXPORT void add_f(Imterface<float32> *im_in1, Imterface<float32> *im_in2, Imterface<float32> * OUT im_out)
{
    // element-wise sum
    for (int y = 0; y < im_in1->height; y++) {}
}

DLL_EXPORT float im_max_f(Imterface<float32> *im)
{
    return 0.0f;
}
"#;

    fn write_interface(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn generates_whole_module() {
        let dir = TempDir::new().unwrap();
        let iface = write_interface(&dir, "pycinterface.cpp", PYCINTERFACE);
        let jobs = vec![LibraryJob::new(&iface, "build", "pycinterface")];

        let module = generate_module(&jobs, &GeneratorConfig::default()).unwrap();
        let expected = "# coding: utf-8\n\"\"\"\nThis file is auto-generated.\n\"\"\"\n\
                        import ctypes\n\
                        import numpy as np\n\
                        from native_library_wrapper import NativeLibraryWrapper\n\
                        \n\
                        _pycinterface_native_lib = NativeLibraryWrapper('build', 'pycinterface')\n\
                        \n\
                        \n\
                        def add_f(im_in1, im_in2, im_out=None):\n    \
                        if im_out is None:\n        \
                        im_out = np.zeros_like(im_in1)\n    \
                        _pycinterface_native_lib.add_f(im_in1, im_in2, im_out)\n    \
                        return im_out\n\
                        \n\
                        \n\
                        def im_max_f(im):\n    \
                        _pycinterface_native_lib.im_max_f.restype = ctypes.c_float\n    \
                        return _pycinterface_native_lib.im_max_f(im)\n\
                        \n";
        assert_eq!(module, expected);
    }

    #[test]
    fn batches_libraries_in_order() {
        let dir = TempDir::new().unwrap();
        let first = write_interface(&dir, "a.h", "DLL_EXPORT int one(int x);");
        let second = write_interface(&dir, "b.h", "DLL_EXPORT double two(double y);");
        let jobs = vec![
            LibraryJob::new(&first, "out/a", "liba"),
            LibraryJob::new(&second, "out/b", "libb"),
        ];

        let module = generate_module(&jobs, &GeneratorConfig::default()).unwrap();
        let a = module.find("_liba_native_lib = ").unwrap();
        let b = module.find("_libb_native_lib = ").unwrap();
        assert!(a < b);
        assert!(module.contains("return _libb_native_lib.two(y)"));
    }

    #[test]
    fn writes_output_file() {
        let dir = TempDir::new().unwrap();
        let iface = write_interface(&dir, "iface.h", "DLL_EXPORT void nop(int a);");
        let out = dir.path().join("native.py");
        let jobs = vec![LibraryJob::new(&iface, ".", "demo")];

        generate_bindings_file(&jobs, &GeneratorConfig::default(), &out).unwrap();

        let written = fs::read_to_string(&out).unwrap();
        assert!(written.ends_with("def nop(a):\n    _demo_native_lib.nop(a)\n\n"));
    }

    #[test]
    fn missing_input_is_fatal() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("native.py");
        let jobs = vec![LibraryJob::new(dir.path().join("missing.h"), ".", "demo")];

        let result = generate_bindings_file(&jobs, &GeneratorConfig::default(), &out);
        assert!(matches!(result, Err(GenerateError::ReadInput { .. })));
        assert!(!out.exists());
    }

    #[test]
    fn failure_in_later_library_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let good = write_interface(&dir, "good.h", "DLL_EXPORT void ok(int a);");
        let bad = write_interface(&dir, "bad.h", "DLL_EXPORT uint64 big(int a);");
        let out = dir.path().join("native.py");
        let jobs = vec![
            LibraryJob::new(&good, ".", "good"),
            LibraryJob::new(&bad, ".", "bad"),
        ];

        let result = generate_bindings_file(&jobs, &GeneratorConfig::default(), &out);
        match result {
            Err(GenerateError::CodeGen { library, .. }) => assert_eq!(library, "bad"),
            other => panic!("Expected CodeGen error, got {:?}", other),
        }
        assert!(!Path::new(&out).exists());
    }

    #[test]
    fn unbalanced_declaration_is_reported() {
        let dir = TempDir::new().unwrap();
        let iface = write_interface(
            &dir,
            "broken.h",
            "DLL_EXPORT void a(int x;\nDLL_EXPORT void b(int lambda);",
        );
        let jobs = vec![LibraryJob::new(&iface, ".", "demo")];

        let err = generate_module(&jobs, &GeneratorConfig::default()).unwrap_err();
        match &err {
            GenerateError::Parse { errors, .. } => assert_eq!(errors.len(), 1),
            other => panic!("Expected Parse error, got {:?}", other),
        }
        assert!(err.to_string().contains("1 parse error(s)"));
    }

    #[test]
    fn parallel_lists_build_jobs_in_order() {
        let jobs = LibraryJob::from_parallel_lists(
            vec!["a.h".into(), "b.h".into()],
            vec!["out/a".to_string(), "out/b".to_string()],
            vec!["liba".to_string(), "libb".to_string()],
        )
        .unwrap();
        assert_eq!(
            jobs,
            vec![
                LibraryJob::new("a.h", "out/a", "liba"),
                LibraryJob::new("b.h", "out/b", "libb"),
            ]
        );
    }

    #[test]
    fn parallel_lists_of_unequal_length_are_rejected() {
        let result = LibraryJob::from_parallel_lists(
            vec!["a.h".into(), "b.h".into()],
            vec!["out".to_string()],
            vec!["liba".to_string(), "libb".to_string()],
        );
        match result {
            Err(GenerateError::MismatchedJobLists {
                inputs,
                base_folders,
                libraries,
            }) => assert_eq!((inputs, base_folders, libraries), (2, 1, 2)),
            other => panic!("Expected MismatchedJobLists, got {:?}", other),
        }
    }

    #[test]
    fn empty_parallel_lists_are_rejected() {
        let result = LibraryJob::from_parallel_lists(Vec::new(), Vec::new(), Vec::new());
        assert!(matches!(result, Err(GenerateError::NoLibraries)));
    }

    fn assert_send_sync<T: Send + Sync + 'static>() {}

    #[test]
    fn errors_convert_into_anyhow() {
        assert_send_sync::<GenerateError>();
        assert_send_sync::<crate::config::ConfigError>();

        let dir = TempDir::new().unwrap();
        let iface = write_interface(&dir, "broken.h", "DLL_EXPORT void a(int x;");
        let jobs = vec![LibraryJob::new(&iface, ".", "demo")];
        let err = anyhow::Error::new(
            generate_module(&jobs, &GeneratorConfig::default()).unwrap_err(),
        )
        .context("generating native.py");
        assert!(format!("{:#}", err).starts_with("generating native.py: 1 parse error(s)"));
    }

    #[test]
    fn custom_marker_from_config() {
        let dir = TempDir::new().unwrap();
        let iface = write_interface(&dir, "api.h", "MYLIB_API int answer(void);");
        let config = GeneratorConfig {
            export_marker: "MYLIB_API".to_string(),
            ..GeneratorConfig::default()
        };
        let jobs = vec![LibraryJob::new(&iface, ".", "mylib")];

        let module = generate_module(&jobs, &config).unwrap();
        assert!(module.contains("def answer():\n"));
    }
}
