//! Server-rendered product pages

use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;

use super::models::{format_price, Product, ProductPage};
use crate::common::FieldErrors;

const HEADER_PARTIAL: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{{title}}</title>
</head>
<body>
<main>
"#;

const FOOTER_PARTIAL: &str = r#"</main>
</body>
</html>
"#;

const ERRORS_PARTIAL: &str = r#"{{#if errors}}
<ul class="errors">
{{#each errors}}    <li data-field="{{field}}">{{message}}</li>
{{/each}}</ul>
{{/if}}"#;

const INDEX_TEMPLATE: &str = r#"{{> header title="Products"}}
<h1>Products</h1>
{{#if is_admin}}<a href="/products/create">Add new product</a>{{/if}}
<table>
    <thead>
        <tr><th>Name</th><th>Price</th><th>Photo</th>{{#if is_admin}}<th></th>{{/if}}</tr>
    </thead>
    <tbody>
{{#each products}}
        <tr>
            <td>{{name}}</td>
            <td>{{price}}</td>
            <td>{{#if photo_url}}<img src="{{photo_url}}" alt="{{photo_name}}" width="64">{{/if}}</td>
{{#if ../is_admin}}
            <td>
                <a href="/products/{{id}}/edit">Edit</a>
                <form method="POST" action="/products/{{id}}">
                    <input type="hidden" name="_method" value="DELETE">
                    <button type="submit">Delete</button>
                </form>
            </td>
{{/if}}
        </tr>
{{else}}
        <tr><td colspan="4">No products found</td></tr>
{{/each}}
    </tbody>
</table>
<nav>
{{#if prev_page}}<a href="/products?page={{prev_page}}">Previous</a>{{/if}}
<span>Page {{current_page}} of {{last_page}}</span>
{{#if next_page}}<a href="/products?page={{next_page}}">Next</a>{{/if}}
</nav>
{{> footer}}"#;

const CREATE_TEMPLATE: &str = r#"{{> header title="Add new product"}}
<h1>Add new product</h1>
{{> errors}}
<form method="POST" action="/products" enctype="multipart/form-data">
    <label>Name <input type="text" name="name" value=""></label>
    <label>Price <input type="text" name="price" value=""></label>
    <label>Photo <input type="file" name="photo"></label>
    <button type="submit">Save</button>
</form>
{{> footer}}"#;

const EDIT_TEMPLATE: &str = r#"{{> header title="Edit product"}}
<h1>Edit product</h1>
{{> errors}}
<form method="POST" action="/products/{{product.id}}" enctype="multipart/form-data">
    <input type="hidden" name="_method" value="PUT">
    <label>Name <input type="text" name="name" value="{{product.name}}"></label>
    <label>Price <input type="text" name="price" value="{{product.price}}"></label>
    <label>Photo <input type="file" name="photo"></label>
    <button type="submit">Save</button>
</form>
{{> footer}}"#;

/// Registers the page templates and partials
pub fn build_views() -> Result<Handlebars<'static>, TemplateError> {
    let mut handlebars = Handlebars::new();

    handlebars.register_partial("header", HEADER_PARTIAL)?;
    handlebars.register_partial("footer", FOOTER_PARTIAL)?;
    handlebars.register_partial("errors", ERRORS_PARTIAL)?;

    handlebars.register_template_string("products_index", INDEX_TEMPLATE)?;
    handlebars.register_template_string("products_create", CREATE_TEMPLATE)?;
    handlebars.register_template_string("products_edit", EDIT_TEMPLATE)?;

    Ok(handlebars)
}

#[derive(Serialize)]
struct ProductRow {
    id: i64,
    name: String,
    price: String,
    photo_url: Option<String>,
    photo_name: Option<String>,
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: format_price(product.price),
            photo_url: product.photo.as_deref().map(photo_url),
            photo_name: product.photo_original_name.clone(),
        }
    }
}

#[derive(Serialize)]
struct IndexView {
    products: Vec<ProductRow>,
    is_admin: bool,
    current_page: i64,
    last_page: i64,
    prev_page: Option<i64>,
    next_page: Option<i64>,
}

#[derive(Serialize)]
struct ErrorLine<'a> {
    field: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct FormView<'a> {
    product: Option<ProductRow>,
    errors: Vec<ErrorLine<'a>>,
}

fn error_lines(errors: &FieldErrors) -> Vec<ErrorLine<'_>> {
    errors
        .iter()
        .flat_map(|(field, messages)| {
            messages.iter().map(move |message| ErrorLine {
                field: field.as_str(),
                message: message.as_str(),
            })
        })
        .collect()
}

/// Public URL of a stored photo key
pub fn photo_url(key: &str) -> String {
    let name = key.rsplit('/').next().unwrap_or(key);
    format!("/photos/{}", name)
}

pub fn render_index(
    views: &Handlebars<'static>,
    page: &ProductPage,
    is_admin: bool,
) -> Result<String, RenderError> {
    let view = IndexView {
        products: page.items.iter().map(ProductRow::from).collect(),
        is_admin,
        current_page: page.current_page,
        last_page: page.last_page,
        prev_page: (page.current_page > 1).then(|| page.current_page - 1),
        next_page: (page.current_page < page.last_page).then(|| page.current_page + 1),
    };
    views.render("products_index", &view)
}

pub fn render_create(
    views: &Handlebars<'static>,
    errors: &FieldErrors,
) -> Result<String, RenderError> {
    views.render(
        "products_create",
        &FormView {
            product: None,
            errors: error_lines(errors),
        },
    )
}

pub fn render_edit(
    views: &Handlebars<'static>,
    product: &Product,
    errors: &FieldErrors,
) -> Result<String, RenderError> {
    views.render(
        "products_edit",
        &FormView {
            product: Some(ProductRow::from(product)),
            errors: error_lines(errors),
        },
    )
}
