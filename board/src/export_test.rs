use std::io::Read;

use canvas::content::{TodoItem, TodoList};
use canvas::doc::WidgetStyle;
use canvas::geometry::Point;
use uuid::Uuid;
use zip::ZipArchive;

use super::*;
use crate::test_helpers::MockStore;

fn widget(kind: WidgetKind, content: &str) -> Widget {
    Widget::new(Uuid::new_v4(), kind, content.to_owned(), Point::default(), WidgetStyle::new())
}

fn names(entries: &[ExportEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}

fn read_entry(archive: &[u8], path: &str) -> Vec<u8> {
    let mut zip = ZipArchive::new(Cursor::new(archive)).unwrap();
    let mut file = zip.by_name(path).unwrap();
    let mut out = Vec::new();
    file.read_to_end(&mut out).unwrap();
    out
}

// =============================================================
// collect_entries
// =============================================================

#[tokio::test]
async fn text_kinds_are_numbered_per_kind() {
    let store = MockStore::new();
    let widgets = vec![
        widget(WidgetKind::StickyNote, "one"),
        widget(WidgetKind::Document, "doc"),
        widget(WidgetKind::StickyNote, "two"),
        widget(WidgetKind::Text, ""),
    ];

    let entries = collect_entries(&widgets, &store).await;
    assert_eq!(names(&entries), vec!["sticky-note_1.txt", "document_1.txt", "sticky-note_2.txt", "text_1.txt"]);
    assert_eq!(entries[2].bytes, b"two");
    assert!(entries[3].bytes.is_empty());
}

#[tokio::test]
async fn todo_lists_become_checklists() {
    let store = MockStore::new();
    let list = TodoList::from(vec![
        TodoItem { id: "a".into(), text: "Buy milk".into(), completed: true },
        TodoItem { id: "b".into(), text: "Walk dog".into(), completed: false },
    ]);
    let widgets = vec![widget(WidgetKind::TodoList, &list.to_content())];

    let entries = collect_entries(&widgets, &store).await;
    assert_eq!(names(&entries), vec!["todo-list_1.txt"]);
    assert_eq!(String::from_utf8(entries[0].bytes.clone()).unwrap(), "- [x] Buy milk\n- [ ] Walk dog\n");
}

#[tokio::test]
async fn images_are_downloaded_and_failures_skipped() {
    let store = MockStore::new();
    store.serve_image("https://cdn.test/a.jpg", b"jpeg");
    store.serve_image("https://cdn.test/c", b"raw");
    let widgets = vec![
        widget(WidgetKind::Image, "https://cdn.test/a.jpg"),
        widget(WidgetKind::Image, "https://cdn.test/missing.gif"),
        widget(WidgetKind::Image, ""),
        widget(WidgetKind::Image, "https://cdn.test/c"),
    ];

    let entries = collect_entries(&widgets, &store).await;
    assert_eq!(names(&entries), vec!["image_1.jpg", "image_2.png"]);
    assert_eq!(entries[0].bytes, b"jpeg");
    assert_eq!(store.call_count("fetch_image"), 3);
}

// =============================================================
// Helpers
// =============================================================

#[test]
fn image_extension_reads_last_segment() {
    assert_eq!(image_extension("https://x.test/bucket/pic.PNG"), "png");
    assert_eq!(image_extension("https://x.test/bucket/pic.webp?token=1.2"), "webp");
    assert_eq!(image_extension("https://x.test/bucket/pic"), "png");
    assert_eq!(image_extension("https://x.test/bucket/.hidden"), "png");
}

#[test]
fn folder_name_falls_back_and_strips_separators() {
    assert_eq!(folder_name("My Dashboard"), "My Dashboard");
    assert_eq!(folder_name("  "), "dashboard");
    assert_eq!(folder_name("a/b\\c"), "a_b_c");
}

#[test]
fn dot_only_titles_use_default_folder() {
    assert_eq!(folder_name(".."), "dashboard");
    assert_eq!(folder_name(" . "), "dashboard");
    assert_eq!(folder_name("../up"), ".._up");
    assert_eq!(folder_name("v1.2"), "v1.2");
}

// =============================================================
// write_archive
// =============================================================

#[tokio::test]
async fn archive_holds_one_folder_named_after_title() {
    let store = MockStore::new();
    let widgets = vec![widget(WidgetKind::StickyNote, "hello"), widget(WidgetKind::Document, "world")];

    let bytes = export_archive("Team Board", &widgets, &store).await.unwrap();

    let zip = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
    let mut files: Vec<&str> = zip.file_names().collect();
    files.sort_unstable();
    assert_eq!(files, vec!["Team Board/", "Team Board/document_1.txt", "Team Board/sticky-note_1.txt"]);
    assert_eq!(read_entry(&bytes, "Team Board/sticky-note_1.txt"), b"hello");
}

#[test]
fn dot_title_never_escapes_the_folder() {
    let entries = vec![ExportEntry { name: "text_1.txt".into(), bytes: b"x".to_vec() }];
    let bytes = write_archive("..", &entries).unwrap();
    let zip = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
    let mut files: Vec<&str> = zip.file_names().collect();
    files.sort_unstable();
    assert_eq!(files, vec!["dashboard/", "dashboard/text_1.txt"]);
}

#[test]
fn empty_export_is_still_a_valid_archive() {
    let bytes = write_archive("", &[]).unwrap();
    let zip = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
    assert_eq!(zip.file_names().collect::<Vec<_>>(), vec!["dashboard/"]);
}
