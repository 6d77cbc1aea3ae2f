// RFS Server
//
// This crate serves a sandboxed directory tree over TCP. Clients send
// newline-delimited JSON requests (GET/PUT/DELETE/DISCONNECT) and receive one
// response per request.

pub mod cli;
pub mod config;
pub mod operations;
pub mod server;
pub mod session;

#[cfg(test)]
mod tests {
    use crate::operations::{process_request, Sandbox};
    use rfs_proto::{Request, Response, StatusCode};
    use std::fs;
    use tempfile::TempDir;

    fn sandbox() -> (TempDir, Sandbox) {
        let dir = TempDir::new().unwrap();
        let sandbox = Sandbox::open(dir.path().join("www")).unwrap();
        (dir, sandbox)
    }

    #[test]
    fn test_sandbox_root_is_created() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("nested").join("www");
        Sandbox::open(&root).unwrap();
        assert!(root.is_dir());
        // Opening an existing root is fine.
        Sandbox::open(&root).unwrap();
    }

    #[test]
    fn test_resolve_stays_under_root() {
        let (_dir, sandbox) = sandbox();
        assert_eq!(
            sandbox.resolve("/a/b/file.txt"),
            sandbox.root().join("a").join("b").join("file.txt")
        );
        assert_eq!(sandbox.resolve("/a/"), sandbox.root().join("a"));
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let (_dir, sandbox) = sandbox();

        let response = process_request(&sandbox, Request::put("/a/b.txt", "hello\nworld")).await;
        assert_eq!(response, Response::created());

        let response = process_request(&sandbox, Request::get("/a/b.txt")).await;
        assert_eq!(response, Response::success("hello\nworld"));

        let on_disk = fs::read_to_string(sandbox.root().join("a").join("b.txt")).unwrap();
        assert_eq!(on_disk, "hello\nworld");
    }

    #[tokio::test]
    async fn test_repeated_put_modifies() {
        let (_dir, sandbox) = sandbox();

        let first =
            process_request(&sandbox, Request::put("/x/y/z.md", "long original text")).await;
        assert_eq!(first.code, StatusCode::Created);

        let second = process_request(&sandbox, Request::put("/x/y/z.md", "short")).await;
        assert_eq!(second, Response::modified());

        let third = process_request(&sandbox, Request::put("/x/y/z.md", "short")).await;
        assert_eq!(third.code, StatusCode::Modified);

        // Overwrite truncates the previous content.
        let response = process_request(&sandbox, Request::get("/x/y/z.md")).await;
        assert_eq!(response.content, "short");
    }

    #[tokio::test]
    async fn test_get_missing_file() {
        let (_dir, sandbox) = sandbox();
        let response = process_request(&sandbox, Request::get("/nope/missing.txt")).await;
        assert_eq!(response, Response::not_found());
    }

    #[tokio::test]
    async fn test_get_directory_is_not_found() {
        let (_dir, sandbox) = sandbox();
        fs::create_dir_all(sandbox.root().join("a").join("b.txt")).unwrap();
        let response = process_request(&sandbox, Request::get("/a/b.txt")).await;
        assert_eq!(response.code, StatusCode::NotFound);
    }

    #[tokio::test]
    async fn test_invalid_targets_are_bad_requests() {
        let (_dir, sandbox) = sandbox();

        for request in [
            Request::get("/a/"),
            Request::get("/../secret.txt"),
            Request::put("/a/", "x"),
            Request::put("relative.txt", "x"),
            Request::delete("/a/../"),
            Request::delete(""),
        ] {
            let response = process_request(&sandbox, request.clone()).await;
            assert_eq!(response, Response::bad_request(), "{request:?}");
        }

        // Nothing was created anywhere.
        assert_eq!(fs::read_dir(sandbox.root()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_delete_file() {
        let (_dir, sandbox) = sandbox();

        let response = process_request(&sandbox, Request::delete("/a/b.txt")).await;
        assert_eq!(response, Response::not_found());

        process_request(&sandbox, Request::put("/a/b.txt", "data")).await;
        let response = process_request(&sandbox, Request::delete("/a/b.txt")).await;
        assert_eq!(response, Response::deleted());

        let response = process_request(&sandbox, Request::get("/a/b.txt")).await;
        assert_eq!(response.code, StatusCode::NotFound);
    }

    #[tokio::test]
    async fn test_delete_directory() {
        let (_dir, sandbox) = sandbox();

        let response = process_request(&sandbox, Request::delete("/a/b/")).await;
        assert_eq!(response, Response::not_found());

        process_request(&sandbox, Request::put("/a/b/c.txt", "data")).await;

        // Non-empty directories are left alone.
        let response = process_request(&sandbox, Request::delete("/a/b/")).await;
        assert_eq!(response, Response::not_found());
        assert!(sandbox.root().join("a").join("b").join("c.txt").is_file());

        process_request(&sandbox, Request::delete("/a/b/c.txt")).await;
        let response = process_request(&sandbox, Request::delete("/a/b/")).await;
        assert_eq!(response, Response::deleted());

        // The parent is not pruned.
        assert!(sandbox.root().join("a").is_dir());
        assert!(!sandbox.root().join("a").join("b").exists());
    }

    #[tokio::test]
    async fn test_delete_file_target_that_is_a_directory() {
        let (_dir, sandbox) = sandbox();
        fs::create_dir_all(sandbox.root().join("d")).unwrap();
        fs::write(sandbox.root().join("d.txt"), "x").unwrap();

        let response = process_request(&sandbox, Request::delete("/d.txt/")).await;
        assert_eq!(response.code, StatusCode::BadRequest);

        let response = process_request(&sandbox, Request::delete("/d/")).await;
        assert_eq!(response.code, StatusCode::Deleted);
    }

    #[tokio::test]
    async fn test_filesystem_fault_is_unknown_error() {
        let (_dir, sandbox) = sandbox();
        // A regular file where an intermediate directory is needed.
        fs::write(sandbox.root().join("blocker"), "x").unwrap();

        let response = process_request(&sandbox, Request::put("/blocker/f.txt", "data")).await;
        assert_eq!(response, Response::unknown_error());
    }

    #[tokio::test]
    async fn test_file_in_place_of_parent_is_not_found() {
        let (_dir, sandbox) = sandbox();
        fs::write(sandbox.root().join("blocker"), "x").unwrap();

        for request in [
            Request::get("/blocker/f.txt"),
            Request::delete("/blocker/f.txt"),
            Request::delete("/blocker/sub/"),
        ] {
            let response = process_request(&sandbox, request.clone()).await;
            assert_eq!(response, Response::not_found(), "{request:?}");
        }
        assert!(sandbox.root().join("blocker").is_file());
    }

    #[tokio::test]
    async fn test_non_utf8_file_is_unknown_error() {
        let (_dir, sandbox) = sandbox();
        fs::write(sandbox.root().join("bin.dat"), [0xff, 0xfe, 0x00]).unwrap();

        let response = process_request(&sandbox, Request::get("/bin.dat")).await;
        assert_eq!(response.code, StatusCode::UnknownError);
    }
}
