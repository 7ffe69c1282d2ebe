use sea_query::Iden;

#[derive(Iden, Clone)]
pub enum Documents {
    Table,
    Seq,
    Collection,
    Id,
    Key,
    Version,
    Body,
    CreatedAt,
    UpdatedAt,
}
