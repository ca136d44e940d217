//! Books command handler: filtered, sorted, paginated listing.

use anyhow::Result;
use book_analytics_core::{BookQuery, Catalog, parse_sort};

use crate::cli::BooksArgs;
use crate::output;

pub async fn run_books_command(catalog: &Catalog, args: &BooksArgs) -> Result<()> {
    let page = catalog.list_books(&book_query(args)?).await?;
    output::print_json(&page)
}

fn book_query(args: &BooksArgs) -> Result<BookQuery> {
    Ok(BookQuery {
        text_query: args.text_query.clone(),
        price_min: args.price_min,
        price_max: args.price_max,
        availability: args.availability.clone(),
        sort: parse_sort(args.sort.as_deref())?,
        limit: args.limit,
        offset: args.offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use book_analytics_core::{CatalogError, SortKey};

    fn args(sort: Option<&str>) -> BooksArgs {
        BooksArgs {
            text_query: Some("cat".to_string()),
            price_min: Some(1.0),
            price_max: None,
            availability: None,
            sort: sort.map(str::to_string),
            limit: 5,
            offset: 2,
        }
    }

    #[test]
    fn test_book_query_maps_arguments() {
        let query = book_query(&args(Some("title_desc"))).unwrap();
        assert_eq!(query.text_query.as_deref(), Some("cat"));
        assert_eq!(query.price_min, Some(1.0));
        assert_eq!(query.sort, Some(SortKey::TitleDesc));
        assert_eq!(query.limit, 5);
        assert_eq!(query.offset, 2);
    }

    #[test]
    fn test_book_query_rejects_unknown_sort_as_invalid_parameter() {
        let err = book_query(&args(Some("newest"))).unwrap_err();
        let catalog_err = err.downcast_ref::<CatalogError>().unwrap();
        assert!(catalog_err.is_invalid_parameter());
    }
}
