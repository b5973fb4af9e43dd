//! Northwind-style fixture.
//!
//! A small customers/orders/order-details data set with known shape:
//!
//! - 5 customers, two of which share a city (Berlin)
//! - 8 orders; the first five by order id carry 9 detail rows total
//! - order 10248 has exactly 3 detail rows
//! - order 10255 has a NULL employee id
//!
//! OrderDetail has a composite identity (order_id, product_id).

use eagerfetch_core::catalog::{Catalog, ColumnDef, ColumnType, EntityDef, RelationDef};
use eagerfetch_core::value::Value;
use eagerfetch_core::Error;

use crate::memory::MemoryRowSource;

/// The fixture catalog: Customer, Order, OrderDetail and their relations.
pub fn catalog() -> Result<Catalog, Error> {
    let customer = EntityDef::new("Customer", "customers")
        .with_key(&["customer_id"])
        .with_column(ColumnDef::new("customer_id", ColumnType::Text))
        .with_column(ColumnDef::new("city", ColumnType::Text));

    let order = EntityDef::new("Order", "orders")
        .with_key(&["order_id"])
        .with_column(ColumnDef::new("order_id", ColumnType::Int32))
        .with_column(ColumnDef::new("customer_id", ColumnType::Text))
        .with_column(ColumnDef::new("employee_id", ColumnType::Int32));

    let detail = EntityDef::new("OrderDetail", "order_details")
        .with_key(&["order_id", "product_id"])
        .with_column(ColumnDef::new("order_id", ColumnType::Int32))
        .with_column(ColumnDef::new("product_id", ColumnType::Int32))
        .with_column(ColumnDef::new("quantity", ColumnType::Int32))
        .with_column(ColumnDef::new("unit_price", ColumnType::Float64));

    Catalog::new()
        .with_entity(customer)?
        .with_entity(order)?
        .with_entity(detail)?
        .with_relation(RelationDef::one_to_many(
            "orders",
            "Customer",
            "customer_id",
            "Order",
            "customer_id",
        ))?
        .with_relation(RelationDef::one_to_many(
            "details",
            "Order",
            "order_id",
            "OrderDetail",
            "order_id",
        ))
}

/// A row source seeded with the fixture data.
pub fn seed() -> MemoryRowSource {
    let source = MemoryRowSource::new();

    source.create_table("customers", &["customer_id", "city"]);
    for (id, city) in [
        ("ALFKI", "Berlin"),
        ("ANATR", "Berlin"),
        ("HANAR", "Rio de Janeiro"),
        ("TOMSP", "Muenster"),
        ("VINET", "Reims"),
    ] {
        source.insert(
            "customers",
            vec![Value::String(id.into()), Value::String(city.into())],
        );
    }

    source.create_table("orders", &["order_id", "customer_id", "employee_id"]);
    for (id, customer, employee) in [
        (10248, "VINET", Some(5)),
        (10249, "TOMSP", Some(6)),
        (10250, "HANAR", Some(4)),
        (10251, "VINET", Some(3)),
        (10252, "HANAR", Some(4)),
        (10253, "HANAR", Some(3)),
        (10254, "ALFKI", Some(5)),
        (10255, "ANATR", None),
    ] {
        source.insert(
            "orders",
            vec![
                Value::Int32(id),
                Value::String(customer.into()),
                employee.map_or(Value::Null, Value::Int32),
            ],
        );
    }

    source.create_table(
        "order_details",
        &["order_id", "product_id", "quantity", "unit_price"],
    );
    for (order, product, quantity, price) in [
        (10248, 11, 12, 14.0),
        (10248, 42, 10, 9.8),
        (10248, 72, 5, 34.8),
        (10249, 14, 9, 18.6),
        (10249, 51, 40, 42.4),
        (10250, 41, 10, 7.7),
        (10251, 22, 6, 16.8),
        (10251, 57, 15, 15.6),
        (10252, 20, 40, 64.8),
        (10253, 31, 20, 10.0),
        (10253, 39, 42, 14.4),
        (10254, 24, 15, 3.6),
        (10255, 2, 20, 15.2),
        (10255, 16, 35, 13.9),
    ] {
        source.insert(
            "order_details",
            vec![
                Value::Int32(order),
                Value::Int32(product),
                Value::Int32(quantity),
                Value::Float64(price),
            ],
        );
    }

    source
}
