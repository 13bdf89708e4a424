use storage::models::{KnowledgeBaseEntry, Message, Product};
use storage::{connect, migrate};

#[tokio::test]
async fn migrations_create_all_tables_and_are_idempotent() {
    let pool = connect("sqlite://file:storage_migrate?mode=memory&cache=shared")
        .await
        .unwrap();
    migrate(&pool).await.unwrap();
    migrate(&pool).await.unwrap();

    sqlx::query("INSERT INTO products (name, price) VALUES (?1, ?2)")
        .bind("Mango")
        .bind(120.0)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO knowledge_base (question, answer) VALUES (?1, ?2)")
        .bind("Do you deliver?")
        .bind("Yes, citywide.")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO messages (sender, content, timestamp) VALUES ('Anonymous', 'hi', 1)")
        .execute(&pool)
        .await
        .unwrap();

    let products = sqlx::query_as::<_, Product>("SELECT * FROM products")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Mango");
    assert_eq!(products[0].description, "");
    assert_eq!(products[0].stock_quantity, 0);
    assert!(products[0].image.is_none());

    let kb = sqlx::query_as::<_, KnowledgeBaseEntry>("SELECT * FROM knowledge_base")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(kb[0].answer, "Yes, citywide.");

    let msgs = sqlx::query_as::<_, Message>("SELECT * FROM messages")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(msgs[0].sender, "Anonymous");
}

#[tokio::test]
async fn connect_creates_database_file_from_plain_path() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("nested").join("chat.db");
    let pool = connect(&path.to_string_lossy()).await.unwrap();
    migrate(&pool).await.unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn connect_reports_unusable_database_directory() {
    let temp = tempfile::tempdir().unwrap();
    let blocker = temp.path().join("data");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let path = blocker.join("chat.db");

    let err = connect(&path.to_string_lossy()).await.unwrap_err();
    assert!(
        format!("{err:#}").contains("create database directory"),
        "{err:#}"
    );
}
