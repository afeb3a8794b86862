mod common;

use common::{heat, matrix, FakeChooser, FakeImdb, TestLibrary};
use movie_curator::reconcile::{DirectoryOutcome, ReconcileOptions, Reconciler};
use movie_curator::{CuratorError, MovieDirectory, MovieLibrary, NameFilter};

fn reconciler(library: &TestLibrary, imdb: &FakeImdb, chooser: &FakeChooser, force: bool) -> Reconciler {
    let options = ReconcileOptions {
        force,
        verbose: true,
        ..ReconcileOptions::default()
    };
    Reconciler::new(
        library.config.clone(),
        options,
        Box::new(imdb.clone()),
        Box::new(chooser.clone()),
    )
}

#[tokio::test]
async fn test_empty_directory_gets_full_missing_report() {
    let library = TestLibrary::new();
    let dir = library.movie_dir("The.Matrix.1999.1080p");
    let imdb = FakeImdb::new()
        .with_results("the matrix 1999", vec![matrix()])
        .with_rating("0133093", 8.7);
    let chooser = FakeChooser::picking("0133093");

    let summary = reconciler(&library, &imdb, &chooser, false)
        .run(&MovieLibrary::new(&library.config.library), &NameFilter::all())
        .await
        .unwrap();

    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.reports_written, 1);

    let report = std::fs::read_to_string(dir.join("missing.txt")).unwrap();
    assert_eq!(
        report,
        "torrent-search -a -i on1337x the+matrix+1999+1080p\n\
         IMDB Search: https://www.imdb.com/find?q=the+matrix+1999+1080p\n\
         The Matrix (1999)\n\
         Rating: 8.7\n\
         https://www.imdb.com/title/tt0133093"
    );
    assert_eq!(imdb.details.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_existing_missing_report_is_reused_without_network() {
    let library = TestLibrary::new();
    let dir = library.movie_dir("Obscure.Film");
    std::fs::write(dir.join("missing.txt"), "stored report").unwrap();
    let imdb = FakeImdb::new();
    let chooser = FakeChooser::declining();

    let outcome = reconciler(&library, &imdb, &chooser, false)
        .reconcile_directory(&MovieDirectory::new(dir.clone()))
        .await
        .unwrap();

    assert_eq!(outcome, DirectoryOutcome::ReportReused);
    assert_eq!(imdb.search_count(), 0);
    assert_eq!(std::fs::read_to_string(dir.join("missing.txt")).unwrap(), "stored report");
}

#[tokio::test]
async fn test_unresolved_report_has_only_search_hints() {
    let library = TestLibrary::new();
    let dir = library.movie_dir("Obscure.Film");
    let imdb = FakeImdb::new();
    let chooser = FakeChooser::declining();

    let outcome = reconciler(&library, &imdb, &chooser, true)
        .reconcile_directory(&MovieDirectory::new(dir.clone()))
        .await
        .unwrap();

    assert_eq!(outcome, DirectoryOutcome::ReportWritten { record: None });
    assert_eq!(
        std::fs::read_to_string(dir.join("missing.txt")).unwrap(),
        "torrent-search -a -i on1337x obscure+film\nIMDB Search: https://www.imdb.com/find?q=obscure+film"
    );
    // "obscure film", "obscure", then the free-text prompt came back blank
    assert_eq!(imdb.search_count(), 2);
    assert_eq!(chooser.prompts.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let library = TestLibrary::new();
    let dir = library.movie_dir("Heat");
    let movie = library.movie_file(&dir, "Heat.1995.mkv");
    let imdb = FakeImdb::new().with_results("heat", vec![heat()]);
    let chooser = FakeChooser::picking("0113277");
    let movie_library = MovieLibrary::new(&library.config.library);

    let first = reconciler(&library, &imdb, &chooser, false)
        .run(&movie_library, &NameFilter::all())
        .await
        .unwrap();
    assert_eq!(first.markers_written, 1);
    assert_eq!(imdb.search_count(), 1);

    let marker = dir.join("Heat.1995.nfo");
    let url = "https://www.imdb.com/title/tt0113277";
    assert_eq!(std::fs::read_to_string(&marker).unwrap(), format!("{}\n", url));

    let outcome = reconciler(&library, &imdb, &chooser, false)
        .reconcile_directory(&MovieDirectory::new(dir.clone()))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        DirectoryOutcome::MarkerPresent {
            movie,
            size: url.len() as u64 + 1
        }
    );
    assert_eq!(imdb.search_count(), 1);
    assert!(!dir.join("missing.txt").exists());
}

#[tokio::test]
async fn test_force_resolves_again() {
    let library = TestLibrary::new();
    let dir = library.movie_dir("Heat");
    let movie = library.movie_file(&dir, "Heat.1995.mkv");
    std::fs::write(dir.join("Heat.1995.nfo"), "https://www.imdb.com/title/tt0000000\n").unwrap();
    let imdb = FakeImdb::new().with_results("heat", vec![heat()]);
    let chooser = FakeChooser::picking("0113277");

    let outcome = reconciler(&library, &imdb, &chooser, true)
        .reconcile_directory(&MovieDirectory::new(dir.clone()))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        DirectoryOutcome::MarkerWritten {
            movie,
            url: "https://www.imdb.com/title/tt0113277".to_string()
        }
    );
    assert_eq!(
        std::fs::read_to_string(dir.join("Heat.1995.nfo")).unwrap(),
        "https://www.imdb.com/title/tt0113277\n"
    );
}

#[tokio::test]
async fn test_missing_to_has_movies_transition() {
    let library = TestLibrary::new();
    let dir = library.movie_dir("Heat");
    std::fs::write(dir.join("missing.txt"), "old report").unwrap();
    library.movie_file(&dir, "Heat.1995.mkv");
    let imdb = FakeImdb::new().with_results("heat", vec![heat()]);
    let chooser = FakeChooser::picking("0113277");

    let outcome = reconciler(&library, &imdb, &chooser, false)
        .reconcile_directory(&MovieDirectory::new(dir.clone()))
        .await
        .unwrap();

    assert!(matches!(outcome, DirectoryOutcome::MarkerWritten { .. }));
    assert!(!dir.join("missing.txt").exists());
    assert!(dir.join("Heat.1995.nfo").exists());
    assert_eq!(imdb.search_count(), 1);
}

#[tokio::test]
async fn test_declined_movie_choice_is_skipped() {
    let library = TestLibrary::new();
    let dir = library.movie_dir("Double.Feature");
    library.movie_file(&dir, "first.mkv");
    library.movie_file(&dir, "second.mkv");
    let imdb = FakeImdb::new();
    let chooser = FakeChooser::declining();

    let outcome = reconciler(&library, &imdb, &chooser, false)
        .reconcile_directory(&MovieDirectory::new(dir.clone()))
        .await
        .unwrap();

    assert_eq!(outcome, DirectoryOutcome::Skipped);
    assert_eq!(chooser.choice_count(), 1);
    assert_eq!(imdb.search_count(), 0);
    assert!(!dir.join("first.nfo").exists());
    assert!(!dir.join("second.nfo").exists());
}

#[tokio::test]
async fn test_loose_root_file_aborts_before_any_directory() {
    let library = TestLibrary::new();
    let dir = library.movie_dir("The.Matrix.1999");
    std::fs::write(library.movies().join("stray.mkv"), common::MKV_HEAD).unwrap();
    let imdb = FakeImdb::new().with_results("the matrix 1999", vec![matrix()]);
    let chooser = FakeChooser::picking("0133093");

    let err = reconciler(&library, &imdb, &chooser, false)
        .run(&MovieLibrary::new(&library.config.library), &NameFilter::all())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CuratorError>(),
        Some(CuratorError::LooseRootFiles(_))
    ));
    assert!(!dir.join("missing.txt").exists());
    assert_eq!(imdb.search_count(), 0);
}

#[tokio::test]
async fn test_non_empty_inbox_aborts_before_any_directory() {
    let library = TestLibrary::new();
    let dir = library.movie_dir("The.Matrix.1999");
    std::fs::create_dir(library.inbox().join("Alien.1979")).unwrap();
    let imdb = FakeImdb::new();
    let chooser = FakeChooser::declining();

    let err = reconciler(&library, &imdb, &chooser, false)
        .run(&MovieLibrary::new(&library.config.library), &NameFilter::all())
        .await
        .unwrap_err();

    let failure = err.downcast_ref::<CuratorError>().unwrap();
    assert!(matches!(failure, CuratorError::InboxNotEmpty { .. }));
    assert_eq!(failure.exit_code(), 1);
    assert!(!dir.join("missing.txt").exists());
}

#[tokio::test]
async fn test_name_filter_limits_the_run() {
    let library = TestLibrary::new();
    let heat_dir = library.movie_dir("Heat");
    let other_dir = library.movie_dir("Alien");
    std::fs::write(heat_dir.join("missing.txt"), "stored").unwrap();
    let imdb = FakeImdb::new();
    let chooser = FakeChooser::declining();

    let summary = reconciler(&library, &imdb, &chooser, false)
        .run(
            &MovieLibrary::new(&library.config.library),
            &NameFilter::new(&["HEAT"]).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.reports_reused, 1);
    assert!(!other_dir.join("missing.txt").exists());
}

#[tokio::test]
async fn test_failing_directory_does_not_stop_the_run() {
    let library = TestLibrary::new();
    let double = library.movie_dir("Double.Feature");
    library.movie_file(&double, "first.mkv");
    library.movie_file(&double, "second.mkv");
    let stored = library.movie_dir("Obscure.Film");
    std::fs::write(stored.join("missing.txt"), "stored report").unwrap();
    let imdb = FakeImdb::new();
    let chooser = FakeChooser::broken();

    let summary = reconciler(&library, &imdb, &chooser, false)
        .run(&MovieLibrary::new(&library.config.library), &NameFilter::all())
        .await
        .unwrap();

    assert_eq!(summary.scanned, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.reports_reused, 1);
    assert_eq!(chooser.choice_count(), 1);
}

#[tokio::test]
async fn test_failed_outcome_carries_the_error() {
    let library = TestLibrary::new();
    let double = library.movie_dir("Double.Feature");
    library.movie_file(&double, "first.mkv");
    library.movie_file(&double, "second.mkv");
    let imdb = FakeImdb::new();
    let chooser = FakeChooser::broken();

    let err = reconciler(&library, &imdb, &chooser, false)
        .reconcile_directory(&MovieDirectory::new(double))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("exit status: 2"));
}

#[tokio::test]
async fn test_accented_name_is_searched_transliterated() {
    let library = TestLibrary::new();
    let dir = library.movie_dir("Amélie.2001");
    let imdb = FakeImdb::new();
    let chooser = FakeChooser::declining();

    reconciler(&library, &imdb, &chooser, true)
        .reconcile_directory(&MovieDirectory::new(dir.clone()))
        .await
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(dir.join("missing.txt")).unwrap(),
        "torrent-search -a -i on1337x amelie+2001\nIMDB Search: https://www.imdb.com/find?q=amelie+2001"
    );
}
