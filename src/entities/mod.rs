pub mod cart;
pub mod cart_item;
pub mod order;
pub mod order_item;
pub mod product;
pub mod user;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Schema};

use crate::entities::{
    cart::Entity as Cart, cart_item::Entity as CartItem, order::Entity as Order,
    order_item::Entity as OrderItem, product::Entity as Product, user::Entity as User,
};

/// Creates every table from its entity definition. Parents before children,
/// so the foreign keys have something to point at.
pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    db.execute(backend.build(&schema.create_table_from_entity(Product)))
        .await?;
    db.execute(backend.build(&schema.create_table_from_entity(User)))
        .await?;
    db.execute(backend.build(&schema.create_table_from_entity(Cart)))
        .await?;
    db.execute(backend.build(&schema.create_table_from_entity(CartItem)))
        .await?;
    db.execute(backend.build(&schema.create_table_from_entity(Order)))
        .await?;
    db.execute(backend.build(&schema.create_table_from_entity(OrderItem)))
        .await?;

    Ok(())
}
