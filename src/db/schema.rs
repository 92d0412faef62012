//! SQL DDL for the store. SQLite dialect.

/// Reserved login of the seeded administrator.
pub const ADMIN_EMAIL: &str = "admin@qualimed.com";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const ADMIN_NAME: &str = "Administrator";

/// Tables in foreign-key dependency order: every referenced table is created
/// before the tables that reference it. `Order` is a keyword and stays quoted.
/// - booleans are INTEGER 0/1
/// - dates are TEXT
/// - no ON DELETE CASCADE anywhere
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS Customer (
    customer_id INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    contact_number TEXT,
    address TEXT,
    is_admin INTEGER DEFAULT 0
);

CREATE TABLE IF NOT EXISTS Product (
    product_id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_name TEXT NOT NULL,
    description TEXT,
    category TEXT,
    price REAL NOT NULL,
    stock_quantity INTEGER NOT NULL DEFAULT 0,
    expirydate TEXT,
    image_path TEXT
);

CREATE TABLE IF NOT EXISTS Cart (
    cart_id INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id INTEGER NOT NULL,
    created_at TEXT,
    FOREIGN KEY(customer_id) REFERENCES Customer(customer_id)
);

CREATE TABLE IF NOT EXISTS Cart_item (
    cart_item_id INTEGER PRIMARY KEY AUTOINCREMENT,
    cart_id INTEGER NOT NULL,
    product_id INTEGER NOT NULL,
    quantity INTEGER NOT NULL,
    FOREIGN KEY(cart_id) REFERENCES Cart(cart_id),
    FOREIGN KEY(product_id) REFERENCES Product(product_id)
);

CREATE TABLE IF NOT EXISTS "Order" (
    order_id INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id INTEGER NOT NULL,
    order_date TEXT,
    total_amount REAL,
    status TEXT,
    FOREIGN KEY(customer_id) REFERENCES Customer(customer_id)
);

CREATE TABLE IF NOT EXISTS Order_item (
    order_item_id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id INTEGER NOT NULL,
    product_id INTEGER NOT NULL,
    quantity INTEGER NOT NULL,
    subtotal REAL,
    FOREIGN KEY(order_id) REFERENCES "Order"(order_id),
    FOREIGN KEY(product_id) REFERENCES Product(product_id)
);

CREATE TABLE IF NOT EXISTS Payment (
    payment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id INTEGER NOT NULL,
    payment_method TEXT,
    payment_status TEXT,
    payment_date TEXT,
    FOREIGN KEY(order_id) REFERENCES "Order"(order_id)
);

-- SQLite does not index foreign key columns on its own.
CREATE INDEX IF NOT EXISTS idx_cart_customer_id ON Cart(customer_id);
CREATE INDEX IF NOT EXISTS idx_cart_item_cart_id ON Cart_item(cart_id);
CREATE INDEX IF NOT EXISTS idx_order_customer_id ON "Order"(customer_id);
CREATE INDEX IF NOT EXISTS idx_order_item_order_id ON Order_item(order_id);
CREATE INDEX IF NOT EXISTS idx_payment_order_id ON Payment(order_id);
"#;

/// Tables created by [`SQLITE_INIT`], in creation order.
pub const TABLES: [&str; 7] = [
    "Customer",
    "Product",
    "Cart",
    "Cart_item",
    "Order",
    "Order_item",
    "Payment",
];
